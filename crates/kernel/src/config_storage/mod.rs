//! Configuration storage abstraction layer.
//!
//! All config reads and writes go through [`ConfigStorage`], so the backend
//! (in-memory for tests, a YAML directory for the CLI) can be swapped without
//! touching call sites.
//!
//! # Entity Types
//!
//! - `menu` - Menu definitions (id, label, description)
//! - `tile` - Tile placements, including each tile's settings
//!
//! # Usage
//!
//! ```ignore
//! // Load a config entity
//! let logo = storage.load("tile", "site_logo")?;
//!
//! // List all entities of a type
//! let menus = storage.list("menu", None)?;
//! ```

mod memory;
pub mod yaml;

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use memory::MemoryConfigStorage;
pub use yaml::YamlConfigStorage;

use crate::menu::Menu;
use crate::tile::TilePlacement;

/// A configuration entity that can be stored and retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity_type", content = "data")]
pub enum ConfigEntity {
    /// Menu definition.
    #[serde(rename = "menu")]
    Menu(Menu),

    /// Tile placement with its settings.
    #[serde(rename = "tile")]
    Tile(TilePlacement),
}

impl ConfigEntity {
    /// Get the entity type name.
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::Menu(_) => entity_types::MENU,
            Self::Tile(_) => entity_types::TILE,
        }
    }

    /// Get the entity ID as a string.
    pub fn id(&self) -> String {
        match self {
            Self::Menu(m) => m.id.clone(),
            Self::Tile(t) => t.machine_name.clone(),
        }
    }

    /// Try to extract a Menu from this entity.
    pub fn as_menu(&self) -> Option<&Menu> {
        match self {
            Self::Menu(m) => Some(m),
            Self::Tile(_) => None,
        }
    }

    /// Try to extract a TilePlacement from this entity.
    pub fn as_tile(&self) -> Option<&TilePlacement> {
        match self {
            Self::Tile(t) => Some(t),
            Self::Menu(_) => None,
        }
    }

    /// Consume and convert to Menu if possible.
    pub fn into_menu(self) -> Option<Menu> {
        match self {
            Self::Menu(m) => Some(m),
            Self::Tile(_) => None,
        }
    }

    /// Consume and convert to TilePlacement if possible.
    pub fn into_tile(self) -> Option<TilePlacement> {
        match self {
            Self::Tile(t) => Some(t),
            Self::Menu(_) => None,
        }
    }

    /// Top-level field of the entity data as a string, for filtering.
    fn field_as_string(&self, field: &str) -> Option<String> {
        let data = match self {
            Self::Menu(m) => serde_json::to_value(m).ok()?,
            Self::Tile(t) => serde_json::to_value(t).ok()?,
        };
        match data.get(field)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for ConfigEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type(), self.id())
    }
}

/// Filter criteria for listing config entities.
#[derive(Debug, Clone, Default)]
pub struct ConfigFilter {
    /// Filter by a specific field value.
    pub field: Option<String>,

    /// Value to match for the field.
    pub value: Option<String>,

    /// Maximum number of results.
    pub limit: Option<usize>,

    /// Number of results to skip.
    pub offset: Option<usize>,
}

impl ConfigFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by a specific field.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self.value = Some(value.into());
        self
    }

    /// Limit results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip results.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Apply the filter to entities already sorted by id.
    pub fn apply(&self, entities: Vec<ConfigEntity>) -> Vec<ConfigEntity> {
        let matched = entities.into_iter().filter(|entity| {
            match (self.field.as_deref(), self.value.as_deref()) {
                (Some(field), Some(value)) => {
                    entity.field_as_string(field).as_deref() == Some(value)
                }
                _ => true,
            }
        });
        matched
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// The core trait for config entity storage.
///
/// Keep the interface small and stable: every backend implements exactly
/// these operations.
pub trait ConfigStorage: Send + Sync {
    /// Load a single config entity by type and ID.
    ///
    /// Returns `None` if the entity doesn't exist.
    fn load(&self, entity_type: &str, id: &str) -> Result<Option<ConfigEntity>>;

    /// Save a config entity (insert or update).
    ///
    /// The entity type and ID are extracted from the entity itself.
    fn save(&self, entity: &ConfigEntity) -> Result<()>;

    /// Delete a config entity by type and ID.
    ///
    /// Returns `true` if an entity was deleted, `false` if it didn't exist.
    fn delete(&self, entity_type: &str, id: &str) -> Result<bool>;

    /// List config entities of a given type, sorted by id, optionally filtered.
    fn list(&self, entity_type: &str, filter: Option<&ConfigFilter>) -> Result<Vec<ConfigEntity>>;

    /// Check if a config entity exists.
    fn exists(&self, entity_type: &str, id: &str) -> Result<bool> {
        Ok(self.load(entity_type, id)?.is_some())
    }
}

/// Entity type constants for use with ConfigStorage.
pub mod entity_types {
    /// Menu definitions.
    pub const MENU: &str = "menu";

    /// Tile placements.
    pub const TILE: &str = "tile";

    /// Every known entity type.
    pub const ALL: &[&str] = &[MENU, TILE];
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn tile(name: &str, region: &str) -> ConfigEntity {
        ConfigEntity::Tile(TilePlacement::new(name, "dom_bootstrap_tabs").region(region))
    }

    #[test]
    fn config_entity_type_names() {
        let menu = ConfigEntity::Menu(Menu {
            id: "main".to_string(),
            label: "Main navigation".to_string(),
            description: String::new(),
        });

        assert_eq!(menu.entity_type(), "menu");
        assert_eq!(menu.id(), "main");
        assert!(menu.as_menu().is_some());
        assert!(menu.as_tile().is_none());
        assert_eq!(format!("{menu}"), "menu:main");
    }

    #[test]
    fn config_filter_builder() {
        let filter = ConfigFilter::new()
            .with_field("region", "header")
            .with_limit(10)
            .with_offset(5);

        assert_eq!(filter.field, Some("region".to_string()));
        assert_eq!(filter.value, Some("header".to_string()));
        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.offset, Some(5));
    }

    #[test]
    fn config_filter_applies_field_limit_offset() {
        let entities = vec![
            tile("a", "header"),
            tile("b", "sidebar"),
            tile("c", "header"),
            tile("d", "header"),
        ];

        let header = ConfigFilter::new().with_field("region", "header");
        let ids: Vec<_> = header.apply(entities.clone()).iter().map(ConfigEntity::id).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);

        let page = header.with_offset(1).with_limit(1);
        let ids: Vec<_> = page.apply(entities).iter().map(ConfigEntity::id).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn config_entity_serialization() {
        let entity = tile("tabs", "header");

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["entity_type"], "tile");
        assert_eq!(json["data"]["machine_name"], "tabs");

        let parsed: ConfigEntity = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, entity);
    }
}
