//! Tile placement: a configured tile instance in a page region.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Region used when a placement doesn't name one.
pub const DEFAULT_REGION: &str = "content";

/// Tile placement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePlacement {
    /// Unique machine name (also the config entity id).
    pub machine_name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Plugin id of the tile implementation.
    pub tile_type: String,
    /// Tile settings; missing keys fall back to the tile's defaults.
    #[serde(default = "empty_settings")]
    pub settings: Value,
    #[serde(default)]
    pub visibility: TileVisibility,
    #[serde(default)]
    pub weight: i32,
    /// Disabled placements never render.
    #[serde(default = "default_status")]
    pub status: bool,
}

/// Visibility rules for a placement.
///
/// - `paths: ["/admin/*", "/user/*"]`: show only on matching paths
/// - `paths_exclude: ["/admin/*"]`: hide on matching paths
/// - `roles: ["authenticated user"]`: show only to users with one of these roles
/// - nothing set: always visible
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileVisibility {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths_exclude: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn empty_settings() -> Value {
    Value::Object(Map::new())
}

fn default_status() -> bool {
    true
}

impl TilePlacement {
    /// Create an enabled placement with default settings.
    pub fn new(machine_name: impl Into<String>, tile_type: impl Into<String>) -> Self {
        let machine_name = machine_name.into();
        Self {
            label: machine_name.clone(),
            machine_name,
            region: default_region(),
            tile_type: tile_type.into(),
            settings: empty_settings(),
            visibility: TileVisibility::default(),
            weight: 0,
            status: true,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }

    pub fn weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn visibility(mut self, visibility: TileVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Check if this tile is visible for a given request path and user roles.
    pub fn is_visible(&self, path: &str, user_roles: &[String]) -> bool {
        let rules = &self.visibility;

        if !rules.roles.is_empty()
            && !rules
                .roles
                .iter()
                .any(|required| user_roles.iter().any(|ur| ur == required))
        {
            return false;
        }

        if !rules.paths.is_empty() {
            return rules.paths.iter().any(|p| path_matches(p, path));
        }

        !rules.paths_exclude.iter().any(|p| path_matches(p, path))
    }
}

/// Simple glob-style path matching (supports trailing `*` only).
fn path_matches(pattern: &str, path: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        path.starts_with(prefix)
    } else {
        path == pattern
    }
}
