//! Collapsible tabs tile.
//!
//! Shows the primary and secondary local tasks of the current page as two
//! `collapsible_links` elements. A level only lists its tabs when the user
//! can see more than one of them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dom_bootstrap_sdk::render::{self, RenderElement};
use dom_bootstrap_sdk::types::CacheMetadata;

use super::{COLLAPSIBLE_LINKS_THEME, Tile, TileContext, decode_settings, encode_settings};
use crate::error::Result;
use crate::form::{Form, FormElement, FormState};
use crate::host::HostServices;
use crate::local_task::{LocalTasks, tab_is_active, tab_title};

pub const PLUGIN_ID: &str = "dom_bootstrap_tabs";

/// Bootstrap grid columns a tab group takes on small screens.
const MOBILE_COLUMN: u8 = 4;

/// Primary title when the page has no breadcrumb.
const DEFAULT_TITLE: &str = "Home";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabsConfig {
    pub primary: bool,
    pub secondary: bool,
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            primary: true,
            secondary: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TabsTile {
    config: TabsConfig,
}

impl TabsTile {
    pub fn new(config: TabsConfig) -> Self {
        Self { config }
    }

    pub fn from_settings(settings: &Value) -> Result<Self> {
        decode_settings(PLUGIN_ID, settings).map(Self::new)
    }

    pub fn config(&self) -> &TabsConfig {
        &self.config
    }
}

impl Tile for TabsTile {
    fn plugin_id(&self) -> &'static str {
        PLUGIN_ID
    }

    fn admin_label(&self) -> &'static str {
        "Collapsible tabs"
    }

    fn default_configuration(&self) -> Value {
        encode_settings(&TabsConfig::default())
    }

    fn configuration(&self) -> Value {
        encode_settings(&self.config)
    }

    fn form(&self, _services: &HostServices) -> Form {
        Form::new(PLUGIN_ID)
            .title(self.admin_label())
            .element(
                "primary",
                FormElement::checkbox()
                    .title("Show primary tabs")
                    .default_value(self.config.primary)
                    .weight(0),
            )
            .element(
                "secondary",
                FormElement::checkbox()
                    .title("Show secondary tabs")
                    .default_value(self.config.secondary)
                    .weight(1),
            )
    }

    fn submit(&mut self, state: &FormState) {
        self.config.primary = state.bool("primary").unwrap_or(false);
        self.config.secondary = state.bool("secondary").unwrap_or(false);
    }

    fn build(&self, ctx: &TileContext) -> RenderElement {
        let manager = ctx.services.local_tasks();
        let mut cacheability = CacheMetadata::new();
        cacheability.add_dependency(manager);

        let mut output = render::container().build();

        if self.config.secondary {
            let tasks = manager.local_tasks(&ctx.route_match, 1, &ctx.user);
            cacheability = cacheability.merge(&tasks.cacheability);
            output.set_child("secondary", tabs_element(tasks, 0));
        }

        if self.config.primary {
            let tasks = manager.local_tasks(&ctx.route_match, 0, &ctx.user);
            cacheability = cacheability.merge(&tasks.cacheability);
            let mut primary = tabs_element(tasks, 1);

            let breadcrumb = ctx.services.breadcrumb().build(&ctx.route_match);
            cacheability = cacheability.merge(&breadcrumb.cacheability);
            let title = breadcrumb
                .last()
                .map_or_else(|| DEFAULT_TITLE.to_string(), |link| link.text.clone());
            primary.set_var("title", title);
            output.set_child("primary", primary);
        }

        let secondary_has_links = output
            .child("secondary")
            .is_some_and(|secondary| !secondary.children.is_empty());
        if secondary_has_links {
            let title = output
                .child("primary")
                .and_then(active_tab_title)
                .map(String::from);
            if let Some(secondary) = output.child_mut("secondary") {
                if let Some(title) = title {
                    secondary.set_var("title", title);
                }
                secondary.set_var("active", true);
            }
        } else if let Some(primary) = output.child_mut("primary") {
            primary.set_var("active", true);
        }

        output.apply_cacheability(&cacheability);
        output
    }
}

/// A `collapsible_links` element listing the tabs of one level.
fn tabs_element(tasks: LocalTasks, weight: i32) -> RenderElement {
    let mut element = render::theme(COLLAPSIBLE_LINKS_THEME)
        .var("mobile_column", MOBILE_COLUMN)
        .weight(weight)
        .build();
    if tasks.visible_count() > 1 {
        element.children = tasks.tabs;
    }
    element
}

/// Title of the active tab listed by a tabs element.
fn active_tab_title(element: &RenderElement) -> Option<&str> {
    element
        .sorted_children()
        .into_iter()
        .map(|(_, tab)| tab)
        .find(|tab| tab_is_active(tab))
        .and_then(tab_title)
}
