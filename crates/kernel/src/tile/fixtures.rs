//! Shared host services for tile unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::host::HostServices;
use crate::local_task::LocalTaskDefinition;
use crate::menu::{Menu, MenuLink, MenuRegistry};
use crate::permissions::UserContext;
use crate::routing::{RouteDefinition, RouteMatch, RouteRegistry};
use crate::tap::{DelimiterRule, DelimiterTap, TAP_COLLAPSIBLE_MENU_ALTER, TapRegistry};

use super::TileContext;

fn route(name: &str, path: &str, title: &str) -> RouteDefinition {
    RouteDefinition {
        name: name.into(),
        path: path.into(),
        title: title.into(),
    }
}

fn menu(id: &str, label: &str) -> Menu {
    Menu {
        id: id.into(),
        label: label.into(),
        description: String::new(),
    }
}

fn task(id: &str, title: &str, route_name: &str, parent: Option<&str>, weight: i32) -> LocalTaskDefinition {
    LocalTaskDefinition {
        id: id.into(),
        title: title.into(),
        route_name: route_name.into(),
        base_route: "entity.node.canonical".into(),
        parent_id: parent.map(String::from),
        weight,
        permission: None,
    }
}

pub(crate) fn routes() -> RouteRegistry {
    RouteRegistry::from_definitions(vec![
        route("page.about", "/about", "About"),
        route("page.team", "/about/team", "Team"),
        route("page.history", "/about/history", "History"),
        route("page.contact", "/contact", "Contact"),
        route("user.page", "/user", "My account"),
        route("user.logout", "/user/logout", "Log out"),
        route("entity.node.canonical", "/node/:node", "Article"),
        route("entity.node.edit_form", "/node/:node/edit", "Edit"),
        route("entity.node.version_history", "/node/:node/revisions", "Revisions"),
        route("entity.node.revisions_diff", "/node/:node/revisions/diff", "Compare"),
    ])
}

pub(crate) fn menus() -> MenuRegistry {
    MenuRegistry::from_parts(
        vec![menu("main", "Main navigation"), menu("account", "User account menu")],
        vec![
            MenuLink::new("home", "main", "Home", "/").weight(-10),
            MenuLink::new("about", "main", "About", "/about"),
            MenuLink::new("team", "main", "Team", "/about/team").parent("about"),
            MenuLink::new("history", "main", "History", "/about/history")
                .parent("about")
                .weight(1),
            MenuLink::new("contact", "main", "Contact", "/contact")
                .weight(5)
                .attribute("class", "contact-link"),
            MenuLink::new("me", "account", "My account", "/user").expanded(),
            MenuLink::new("logout", "account", "Log out", "/user/logout").parent("me"),
        ],
    )
}

pub(crate) fn local_tasks() -> Vec<LocalTaskDefinition> {
    vec![
        task("node.view", "View", "entity.node.canonical", None, 0),
        task("node.edit", "Edit", "entity.node.edit_form", None, 1),
        task("node.revisions", "Revisions", "entity.node.version_history", None, 2),
        task(
            "node.revisions.list",
            "List",
            "entity.node.version_history",
            Some("node.revisions"),
            0,
        ),
        task(
            "node.revisions.diff",
            "Compare",
            "entity.node.revisions_diff",
            Some("node.revisions"),
            1,
        ),
    ]
}

pub(crate) fn services_with_taps(taps: TapRegistry) -> HostServices {
    HostServices::new(routes(), menus(), local_tasks(), taps)
}

pub(crate) fn services() -> HostServices {
    services_with_taps(TapRegistry::new())
}

/// Services whose account menu gets a delimiter in front of "Log out".
pub(crate) fn services_with_delimiter() -> HostServices {
    let mut taps = TapRegistry::new();
    let tap = DelimiterTap::new(vec![DelimiterRule {
        menu: "account".into(),
        before: "logout".into(),
    }]);
    taps.register(TAP_COLLAPSIBLE_MENU_ALTER, "dom_bootstrap", 0, Arc::new(tap))
        .expect("valid tap");
    services_with_taps(taps)
}

/// Context for a request to `path` by an anonymous user.
pub(crate) fn context(services: &HostServices, path: &str) -> TileContext {
    let route_match = services.routes().match_path(path).unwrap_or_else(|| RouteMatch {
        route_name: "unknown".into(),
        path: path.into(),
        params: HashMap::new(),
    });
    TileContext::new(route_match, UserContext::anonymous(), services.clone())
}
