//! Tiles: configurable blocks placed in page regions.
//!
//! A tile plugin turns host data (menus, local tasks, breadcrumbs) into a
//! render tree. Each plugin carries its own typed configuration, exposes a
//! configuration form, and declares the cache tags and contexts its output
//! depends on.

mod collapsible_menu;
#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod fixtures;
mod placement;
mod registry;
mod tabs;
mod text_logo;

use std::collections::BTreeSet;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use dom_bootstrap_sdk::render::RenderElement;
use dom_bootstrap_sdk::types::CacheMetadata;

use crate::error::{Error, Result};
use crate::form::{Form, FormState};
use crate::host::HostServices;
use crate::permissions::UserContext;
use crate::routing::RouteMatch;

pub use collapsible_menu::{CollapsibleMenuConfig, CollapsibleMenuTile};
pub use placement::{DEFAULT_REGION, TilePlacement, TileVisibility};
pub use registry::{TileDefinition, TileRegistry, configure_placement};
pub use tabs::{TabsConfig, TabsTile};
pub use text_logo::{TextLogoConfig, TextLogoTile};

/// Category all tiles in this crate are listed under.
pub const TILE_CATEGORY: &str = "DOM bootstrap";

/// Theme hook rendering a title with a collapsible list of links.
pub const COLLAPSIBLE_LINKS_THEME: &str = "collapsible_links";

/// Theme hook rendering a Bootstrap icon.
pub const BOOTSTRAP_ICON_THEME: &str = "bootstrap_icon";

/// Per-request data a tile builds from.
#[derive(Debug, Clone)]
pub struct TileContext {
    pub route_match: RouteMatch,
    pub user: UserContext,
    pub services: HostServices,
}

impl TileContext {
    pub fn new(route_match: RouteMatch, user: UserContext, services: HostServices) -> Self {
        Self {
            route_match,
            user,
            services,
        }
    }
}

/// A tile plugin instance.
pub trait Tile: Send + Sync {
    /// Machine name of the plugin (e.g., "dom_bootstrap_tabs").
    fn plugin_id(&self) -> &'static str;

    /// Label shown when placing the tile.
    fn admin_label(&self) -> &'static str;

    fn category(&self) -> &'static str {
        TILE_CATEGORY
    }

    /// Configuration of a freshly placed tile.
    fn default_configuration(&self) -> Value;

    /// Current configuration, as stored in the placement settings.
    fn configuration(&self) -> Value;

    /// Configuration form, pre-filled with the current configuration.
    fn form(&self, services: &HostServices) -> Form;

    /// Copy validated form values into the configuration.
    fn submit(&mut self, state: &FormState);

    /// Build the render tree for the current request.
    fn build(&self, ctx: &TileContext) -> RenderElement;

    fn cache_tags(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn cache_contexts(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Tags and contexts combined, applied to the tile's output.
    fn cache_metadata(&self) -> CacheMetadata {
        let mut metadata = CacheMetadata::new();
        metadata.add_tags(self.cache_tags());
        metadata.add_contexts(self.cache_contexts());
        metadata
    }
}

/// Decode placement settings into a tile configuration.
///
/// `null` counts as empty settings; missing keys take their defaults.
pub(crate) fn decode_settings<T: DeserializeOwned>(tile: &str, settings: &Value) -> Result<T> {
    let settings = match settings {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(settings).map_err(|source| Error::InvalidSettings {
        tile: tile.to_string(),
        source,
    })
}

/// Encode a tile configuration for storage.
pub(crate) fn encode_settings<T: Serialize>(config: &T) -> Value {
    serde_json::to_value(config).unwrap_or(Value::Null)
}
