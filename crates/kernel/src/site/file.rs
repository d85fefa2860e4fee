//! The YAML site file: everything the host knows about a site.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::local_task::LocalTaskDefinition;
use crate::menu::{Menu, MenuLink};
use crate::permissions::UserContext;
use crate::routing::RouteDefinition;
use crate::tap::DelimiterRule;
use crate::tile::TilePlacement;

/// An account that can be rendered for with `--user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteUser {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl SiteUser {
    pub fn context(&self) -> UserContext {
        UserContext::authenticated(&self.name, self.roles.clone(), self.permissions.clone())
    }
}

/// Parsed site file.
///
/// ```yaml
/// name: Example
/// routes:
///   - { name: page.about, path: /about, title: About }
/// menus:
///   - { id: main, label: Main navigation }
/// menu_links:
///   - { id: about, menu_name: main, title: About, path: /about }
/// tiles:
///   - { machine_name: nav, tile_type: dom_bootstrap_collapsible_menu, region: header,
///       settings: { menu_name: main } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteFile {
    pub name: String,
    pub routes: Vec<RouteDefinition>,
    pub menus: Vec<Menu>,
    pub menu_links: Vec<MenuLink>,
    pub local_tasks: Vec<LocalTaskDefinition>,
    pub users: Vec<SiteUser>,
    /// Placements seeded into config storage on first load.
    pub tiles: Vec<TilePlacement>,
    /// Delimiters inserted into collapsible menus.
    pub delimiters: Vec<DelimiterRule>,
}

impl SiteFile {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content).context("invalid site YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read site file {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}
