//! Tile plugin registry and the placement configuration flow.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{
    CollapsibleMenuTile, TabsTile, TextLogoTile, Tile, TilePlacement, collapsible_menu, tabs,
    text_logo,
};
use crate::error::{Error, Result};
use crate::form::{FormState, validate_form};
use crate::host::HostServices;

/// Builds a tile instance from placement settings.
pub type TileFactory = fn(&Value) -> Result<Box<dyn Tile>>;

/// What a plugin is, without an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileDefinition {
    pub id: String,
    pub label: String,
    pub category: String,
}

/// Registry of tile plugins, keyed by plugin id.
#[derive(Clone, Default)]
pub struct TileRegistry {
    factories: BTreeMap<String, (TileDefinition, TileFactory)>,
}

impl TileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the collapsible menu, tabs and text logo tiles.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(collapsible_menu::PLUGIN_ID, |settings| {
            Ok(Box::new(CollapsibleMenuTile::from_settings(settings)?))
        });
        registry.register(tabs::PLUGIN_ID, |settings| {
            Ok(Box::new(TabsTile::from_settings(settings)?))
        });
        registry.register(text_logo::PLUGIN_ID, |settings| {
            Ok(Box::new(TextLogoTile::from_settings(settings)?))
        });
        registry
    }

    /// Register a plugin. The definition is taken from a default instance.
    ///
    /// Returns false (and keeps the existing plugin) if the id is taken or
    /// the factory cannot build a default instance.
    pub fn register(&mut self, plugin_id: &str, factory: TileFactory) -> bool {
        if self.factories.contains_key(plugin_id) {
            debug!(plugin = %plugin_id, "tile plugin already registered");
            return false;
        }
        let instance = match factory(&Value::Null) {
            Ok(instance) => instance,
            Err(e) => {
                debug!(plugin = %plugin_id, error = %e, "tile plugin has no default instance");
                return false;
            }
        };
        let definition = TileDefinition {
            id: plugin_id.to_string(),
            label: instance.admin_label().to_string(),
            category: instance.category().to_string(),
        };
        self.factories
            .insert(plugin_id.to_string(), (definition, factory));
        true
    }

    pub fn get(&self, plugin_id: &str) -> Option<&TileDefinition> {
        self.factories.get(plugin_id).map(|(definition, _)| definition)
    }

    /// All plugin definitions, ordered by id.
    pub fn definitions(&self) -> Vec<&TileDefinition> {
        self.factories.values().map(|(definition, _)| definition).collect()
    }

    /// Instantiate a plugin with the given settings.
    pub fn create(&self, plugin_id: &str, settings: &Value) -> Result<Box<dyn Tile>> {
        let (_, factory) = self
            .factories
            .get(plugin_id)
            .ok_or_else(|| Error::UnknownTile(plugin_id.to_string()))?;
        factory(settings)
    }

    /// Instantiate the plugin behind a placement.
    pub fn create_for(&self, placement: &TilePlacement) -> Result<Box<dyn Tile>> {
        self.create(&placement.tile_type, &placement.settings)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for TileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileRegistry")
            .field("plugins", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Validate submitted form values for a placement and store the result.
///
/// On success the placement's settings hold the tile's new configuration.
/// Validation failures leave the placement untouched.
pub fn configure_placement(
    registry: &TileRegistry,
    services: &HostServices,
    placement: &mut TilePlacement,
    values: impl IntoIterator<Item = (String, Value)>,
) -> Result<()> {
    let mut tile = registry.create_for(placement)?;
    let form = tile.form(services);

    let mut state = FormState::for_form(&form);
    for (name, value) in values {
        state.set_value(name, value);
    }

    let errors = validate_form(&form, &state);
    if !errors.is_empty() {
        return Err(Error::Validation {
            form_id: form.form_id,
            errors,
        });
    }

    tile.submit(&state);
    placement.settings = tile.configuration();
    info!(
        placement = %placement.machine_name,
        tile = %placement.tile_type,
        "tile configuration saved"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tile::fixtures;

    #[test]
    fn defaults_register_three_tiles() {
        let registry = TileRegistry::with_defaults();
        let ids: Vec<_> = registry.definitions().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "dom_bootstrap_collapsible_menu",
                "dom_bootstrap_tabs",
                "dom_bootstrap_text_logo"
            ]
        );

        let tabs = registry.get("dom_bootstrap_tabs").unwrap();
        assert_eq!(tabs.label, "Collapsible tabs");
        assert_eq!(tabs.category, "DOM bootstrap");
        assert_eq!(
            registry.get("dom_bootstrap_text_logo").unwrap().label,
            "Text Logo"
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = TileRegistry::with_defaults();
        assert!(!registry.register(tabs::PLUGIN_ID, |settings| {
            Ok(Box::new(TabsTile::from_settings(settings)?))
        }));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn create_reports_unknown_and_invalid() {
        let registry = TileRegistry::with_defaults();
        assert!(matches!(
            registry.create("nope", &Value::Null),
            Err(Error::UnknownTile(id)) if id == "nope"
        ));
        assert!(matches!(
            registry.create("dom_bootstrap_tabs", &json!({"primary": "sometimes"})),
            Err(Error::InvalidSettings { .. })
        ));

        let tile = registry
            .create("dom_bootstrap_text_logo", &json!({"bold": "Acme"}))
            .unwrap();
        assert_eq!(
            tile.configuration(),
            json!({"bold": "Acme", "thin": "", "include_mobile": true})
        );
    }

    #[test]
    fn configure_placement_stores_settings() {
        let registry = TileRegistry::with_defaults();
        let services = fixtures::services();
        let mut placement = TilePlacement::new("nav", "dom_bootstrap_collapsible_menu");

        configure_placement(
            &registry,
            &services,
            &mut placement,
            [("menu_name".to_string(), json!("account"))],
        )
        .unwrap();
        assert_eq!(placement.settings, json!({"menu_name": "account"}));
    }

    #[test]
    fn configure_placement_rejects_invalid_values() {
        let registry = TileRegistry::with_defaults();
        let services = fixtures::services();
        let mut placement = TilePlacement::new("nav", "dom_bootstrap_collapsible_menu")
            .settings(json!({"menu_name": "main"}));

        let err = configure_placement(
            &registry,
            &services,
            &mut placement,
            [("menu_name".to_string(), json!("nonexistent"))],
        )
        .unwrap_err();
        let Error::Validation { form_id, errors } = err else {
            panic!("expected a validation error");
        };
        assert_eq!(form_id, "dom_bootstrap_collapsible_menu");
        assert_eq!(errors.len(), 1);
        assert_eq!(placement.settings, json!({"menu_name": "main"}));
    }
}
