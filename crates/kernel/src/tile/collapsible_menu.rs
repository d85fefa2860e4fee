//! Collapsible menu tile.
//!
//! Renders the first two levels of a menu as Bootstrap collapsibles: every
//! top-level link becomes a `collapsible_links` element whose children are
//! the second-level links. Alter taps may inject delimiters between the
//! children, which render as `<hr />`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use dom_bootstrap_sdk::render::{self, RenderElement};
use dom_bootstrap_sdk::types::FRONT_ROUTE;

use super::{COLLAPSIBLE_LINKS_THEME, Tile, TileContext, decode_settings, encode_settings};
use crate::error::Result;
use crate::form::{Form, FormElement, FormState};
use crate::host::HostServices;
use crate::menu::{Menu, MenuActiveTrail, MenuEntry, MenuItem, MenuTreeParameters, TreeManipulator};

pub const PLUGIN_ID: &str = "dom_bootstrap_collapsible_menu";

/// Bootstrap collapsibles nest one level deep.
const MAX_DEPTH: usize = 2;

/// Attribute carrying the internal path of a leaf link.
const SYSTEM_PATH_ATTRIBUTE: &str = "data-drupal-link-system-path";

const MENU_NAME_DESCRIPTION: &str =
    "The menu will be shown up to second level due to bootstrap collapsible limitations.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollapsibleMenuConfig {
    /// Machine name of the menu to render.
    pub menu_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct CollapsibleMenuTile {
    config: CollapsibleMenuConfig,
}

impl CollapsibleMenuTile {
    pub fn new(config: CollapsibleMenuConfig) -> Self {
        Self { config }
    }

    pub fn from_settings(settings: &Value) -> Result<Self> {
        decode_settings(PLUGIN_ID, settings).map(Self::new)
    }

    pub fn config(&self) -> &CollapsibleMenuConfig {
        &self.config
    }
}

impl Tile for CollapsibleMenuTile {
    fn plugin_id(&self) -> &'static str {
        PLUGIN_ID
    }

    fn admin_label(&self) -> &'static str {
        "Collapsible menu"
    }

    fn default_configuration(&self) -> Value {
        encode_settings(&CollapsibleMenuConfig::default())
    }

    fn configuration(&self) -> Value {
        encode_settings(&self.config)
    }

    fn form(&self, services: &HostServices) -> Form {
        let options = services
            .menus()
            .load_multiple()
            .into_iter()
            .map(|menu| (menu.id.clone(), menu.label.clone()))
            .collect();

        Form::new(PLUGIN_ID).title(self.admin_label()).element(
            "menu_name",
            FormElement::select(options)
                .title("Menu name")
                .description(MENU_NAME_DESCRIPTION)
                .default_value(self.config.menu_name.clone())
                .required(),
        )
    }

    fn submit(&mut self, state: &FormState) {
        if let Some(menu_name) = state.string("menu_name") {
            self.config.menu_name = menu_name;
        }
    }

    fn build(&self, ctx: &TileContext) -> RenderElement {
        let menu_name = self.config.menu_name.as_str();
        let services = &ctx.services;
        if services.menus().menu(menu_name).is_none() {
            debug!(menu = %menu_name, "collapsible menu points at an unknown menu");
        }

        let trail = services
            .active_trail()
            .active_trail_ids(menu_name, &ctx.route_match);
        let params = MenuTreeParameters::new()
            .set_active_trail(trail)
            .set_max_depth(MAX_DEPTH);

        let tree = services.menu_tree().load(menu_name, &params);
        let tree = services.menu_tree().transform(
            tree,
            &[TreeManipulator::CheckAccess, TreeManipulator::GenerateIndexAndSort],
            &ctx.user,
        );
        let mut build = services.menu_tree().build(menu_name, &tree);
        services.taps().alter_collapsible_menu(&mut build);

        let mut output = render::container().cache(build.cache.clone()).build();
        for (position, entry) in build.items.iter().enumerate() {
            let MenuEntry::Item(item) = entry else {
                debug!(menu = %menu_name, key = %entry.key(), "ignoring top-level delimiter");
                continue;
            };
            output.set_child(&item.key, collapsible_item(item, position_weight(position)));
        }
        output
    }

    fn cache_tags(&self) -> BTreeSet<String> {
        BTreeSet::from([Menu::cache_tag(&self.config.menu_name)])
    }

    fn cache_contexts(&self) -> BTreeSet<String> {
        BTreeSet::from([MenuActiveTrail::cache_context(&self.config.menu_name)])
    }
}

/// Reshape a top-level item into a `collapsible_links` element.
fn collapsible_item(item: &MenuItem, weight: i32) -> RenderElement {
    let mut element = render::theme(COLLAPSIBLE_LINKS_THEME)
        .weight(weight)
        .var("title", item.title.clone())
        .var("title_url", item.url.to_string())
        .var("title_attributes", Value::Object(item.attributes.clone()))
        .var("active", item.in_active_trail)
        .var(
            "collapsed",
            !(item.in_active_trail || item.original_link.expanded),
        )
        .build();

    if item.below.is_empty() {
        let system_path = if item.url.is_front() {
            FRONT_ROUTE
        } else {
            item.url.internal_path()
        };
        let mut attributes: Map<String, Value> = item.attributes.clone();
        attributes.insert(SYSTEM_PATH_ATTRIBUTE.into(), system_path.into());
        element.set_var("title_attributes", Value::Object(attributes));
        element.set_var("icons", Value::Array(Vec::new()));
        return element;
    }

    // The title toggles the collapsible, so it links nowhere
    element.remove_var("title_url");
    for (position, child) in item.below.iter().enumerate() {
        let weight = position_weight(position);
        let link = match child {
            MenuEntry::Delimiter { .. } => render::html_tag("hr").weight(weight).build(),
            MenuEntry::Item(child) => render::link(&child.url, &child.title)
                .attributes(&child.attributes)
                .weight(weight)
                .build(),
        };
        element.set_child(child.key(), link);
    }
    element
}

fn position_weight(position: usize) -> i32 {
    i32::try_from(position).unwrap_or(i32::MAX)
}
