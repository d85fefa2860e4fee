//! Route registry - named routes with path patterns.
//!
//! Routes are declared in the site definition. The registry resolves request
//! paths to a [`RouteMatch`] and builds URLs from route names, which local
//! tasks and menu links use to point at pages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dom_bootstrap_sdk::types::{FRONT_ROUTE, Url};

use crate::error::{Error, Result};

/// A named route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDefinition {
    /// Machine name (e.g., "entity.node.edit_form").
    pub name: String,
    /// URL path pattern (e.g., "/node/:node/edit").
    pub path: String,
    /// Human-readable page title, used by breadcrumbs.
    #[serde(default)]
    pub title: String,
}

/// Result of matching a path against registered routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Name of the matched route.
    pub route_name: String,
    /// The request path that was matched.
    pub path: String,
    /// Path parameters extracted (e.g., {"node": "1"}).
    pub params: HashMap<String, String>,
}

impl RouteMatch {
    /// Match for the front page.
    pub fn front() -> Self {
        Self {
            route_name: FRONT_ROUTE.to_string(),
            path: "/".to_string(),
            params: HashMap::new(),
        }
    }
}

/// Registry of all routes known to the site.
#[derive(Debug)]
pub struct RouteRegistry {
    /// All routes, indexed by name.
    routes: HashMap<String, RouteDefinition>,
    /// Route names ordered for matching, most specific first.
    match_order: Vec<String>,
}

impl RouteRegistry {
    /// Create a registry holding only the front page route.
    pub fn new() -> Self {
        let mut registry = Self {
            routes: HashMap::new(),
            match_order: Vec::new(),
        };
        registry.register(RouteDefinition {
            name: FRONT_ROUTE.to_string(),
            path: "/".to_string(),
            title: "Home".to_string(),
        });
        registry
    }

    /// Create a registry from route definitions.
    pub fn from_definitions(definitions: Vec<RouteDefinition>) -> Self {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition);
        }
        registry
    }

    /// Register a route, replacing any route with the same name.
    pub fn register(&mut self, route: RouteDefinition) {
        if self.routes.contains_key(&route.name) {
            warn!(route = %route.name, "route redefined");
        }
        self.routes.insert(route.name.clone(), route);
        self.build_match_order();
    }

    /// Order routes for path matching.
    fn build_match_order(&mut self) {
        self.match_order = self.routes.keys().cloned().collect();

        // Fewer params = more specific = first; deeper paths before shallower ones
        let routes = &self.routes;
        self.match_order.sort_by_key(|name| {
            let path = routes.get(name).map(|r| r.path.as_str()).unwrap_or("");
            let param_count = path.matches(':').count();
            let segment_count = path.matches('/').count();
            (param_count, -(segment_count as i32), name.clone())
        });

        debug!(routes = self.match_order.len(), "built route table");
    }

    /// Match a request path against registered routes.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let path = normalize(path);
        for name in &self.match_order {
            if let Some(route) = self.routes.get(name)
                && let Some(params) = match_pattern(&route.path, &path)
            {
                return Some(RouteMatch {
                    route_name: route.name.clone(),
                    path,
                    params,
                });
            }
        }
        None
    }

    /// Get a route by name.
    pub fn get(&self, name: &str) -> Option<&RouteDefinition> {
        self.routes.get(name)
    }

    /// Build a URL for a route, substituting path parameters.
    pub fn url_for(&self, name: &str, params: &HashMap<String, String>) -> Result<Url> {
        let route = self
            .routes
            .get(name)
            .ok_or_else(|| Error::UnknownRoute(name.to_string()))?;

        let path = route
            .path
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => params
                    .get(param)
                    .map(|v| urlencoding::encode(v).into_owned())
                    .unwrap_or_else(|| segment.to_string()),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/");

        Ok(Url::routed(name, path))
    }

    /// Get route count.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip trailing slashes and query strings so "/a/b/" matches "/a/b".
fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Match a route pattern against a path, extracting parameters.
///
/// Parameter values are percent-decoded; a segment that doesn't decode to
/// UTF-8 matches nothing.
///
/// Pattern: "/node/:node/edit"
/// Path: "/node/1/edit"
/// Result: Some({"node": "1"})
fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').collect();
    let path_parts: Vec<&str> = path.split('/').collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pat, actual) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(param_name) = pat.strip_prefix(':') {
            if actual.is_empty() {
                return None;
            }
            let value = urlencoding::decode(actual).ok()?;
            params.insert(param_name.to_string(), value.into_owned());
        } else if pat != actual {
            return None;
        }
    }

    Some(params)
}
