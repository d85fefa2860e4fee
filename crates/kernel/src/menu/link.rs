//! Menu and menu link definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use dom_bootstrap_sdk::types::Url;

use crate::routing::RouteRegistry;

/// A named menu (e.g., "main", "footer", "account").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    /// Machine name.
    pub id: String,
    /// Human-readable label shown in tile forms.
    pub label: String,
    #[serde(default)]
    pub description: String,
}

impl Menu {
    /// Cache tag invalidated whenever this menu or its links change.
    pub fn cache_tag(menu_name: &str) -> String {
        format!("config:system.menu.{menu_name}")
    }
}

/// A navigational link placed in a menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuLink {
    /// Unique identifier (e.g., "main.about").
    pub id: String,

    /// Menu machine name.
    pub menu_name: String,

    /// Display title.
    pub title: String,

    /// Route the link points at; takes precedence over `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_name: Option<String>,

    /// Parameters substituted into the route path.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub route_parameters: HashMap<String, String>,

    /// Link destination path, used when no route is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Optional parent link for hierarchy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Sort weight (lower = higher priority).
    #[serde(default)]
    pub weight: i32,

    /// Whether children are shown even when the link is not in the active trail.
    #[serde(default)]
    pub expanded: bool,

    /// Disabled links are never loaded into a tree.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Permission required to see the link (none = public).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,

    /// Extra HTML attributes for the rendered anchor.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

impl MenuLink {
    /// Create an enabled top-level link pointing at a path.
    pub fn new(
        id: impl Into<String>,
        menu_name: impl Into<String>,
        title: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            menu_name: menu_name.into(),
            title: title.into(),
            route_name: None,
            route_parameters: HashMap::new(),
            path: Some(path.into()),
            parent: None,
            weight: 0,
            expanded: false,
            enabled: true,
            permission: None,
            attributes: Map::new(),
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn expanded(mut self) -> Self {
        self.expanded = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn route(mut self, route_name: impl Into<String>) -> Self {
        self.route_name = Some(route_name.into());
        self
    }

    pub fn attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Resolve the link to a URL.
    ///
    /// Routed links are built from their route; path links are matched back
    /// to a route so front-page detection works. Anything the router cannot
    /// place stays an unrouted URL.
    pub fn url(&self, routes: &RouteRegistry) -> Url {
        if let Some(route_name) = &self.route_name
            && let Ok(url) = routes.url_for(route_name, &self.route_parameters)
        {
            return url;
        }

        let path = self.path.as_deref().unwrap_or("/");
        match routes.match_path(path) {
            Some(m) => Url::routed(m.route_name, m.path),
            None => Url::unrouted(path),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::routing::RouteDefinition;

    fn routes() -> RouteRegistry {
        RouteRegistry::from_definitions(vec![RouteDefinition {
            name: "entity.node.canonical".into(),
            path: "/node/:node".into(),
            title: "Content".into(),
        }])
    }

    #[test]
    fn deserializes_with_defaults() {
        let link: MenuLink = serde_json::from_value(serde_json::json!({
            "id": "main.about",
            "menu_name": "main",
            "title": "About",
            "path": "/about"
        }))
        .unwrap();
        assert!(link.enabled);
        assert!(!link.expanded);
        assert_eq!(link.weight, 0);
        assert!(link.parent.is_none());
    }

    #[test]
    fn path_link_resolves_to_route() {
        let routes = routes();
        let url = MenuLink::new("a", "main", "A", "/node/3").url(&routes);
        assert_eq!(url.route_name(), Some("entity.node.canonical"));

        let front = MenuLink::new("h", "main", "Home", "/").url(&routes);
        assert!(front.is_front());

        let other = MenuLink::new("x", "main", "X", "/nowhere").url(&routes);
        assert_eq!(other.route_name(), None);
        assert_eq!(other.to_string(), "/nowhere");
    }

    #[test]
    fn route_link_uses_parameters() {
        let routes = routes();
        let mut link = MenuLink::new("n", "main", "Node", "/unused").route("entity.node.canonical");
        link.route_parameters.insert("node".into(), "9".into());
        assert_eq!(link.url(&routes).to_string(), "/node/9");
    }

    #[test]
    fn cache_tag_format() {
        assert_eq!(Menu::cache_tag("main"), "config:system.menu.main");
    }
}
