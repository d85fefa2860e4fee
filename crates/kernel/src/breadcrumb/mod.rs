//! Breadcrumbs for the current page.

use std::sync::Arc;

use dom_bootstrap_sdk::types::{CacheMetadata, Link, Url};

use crate::routing::{RouteMatch, RouteRegistry};

/// Cache context for output that varies by request path.
pub const PATH_CONTEXT: &str = "url.path";

/// A trail of links leading to the current page (the page itself excluded).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breadcrumb {
    pub links: Vec<Link>,
    pub cacheability: CacheMetadata,
}

impl Breadcrumb {
    /// The closest ancestor of the current page.
    pub fn last(&self) -> Option<&Link> {
        self.links.last()
    }
}

/// Builds breadcrumbs for a route.
pub trait BreadcrumbBuilder: Send + Sync {
    fn build(&self, route_match: &RouteMatch) -> Breadcrumb;
}

/// Derives breadcrumbs from the path hierarchy.
///
/// `/node/1/revisions` yields Home, then the pages at `/node/1` and `/node`
/// when routes with titles exist for them.
#[derive(Debug, Clone)]
pub struct PathBasedBreadcrumbBuilder {
    routes: Arc<RouteRegistry>,
}

impl PathBasedBreadcrumbBuilder {
    pub fn new(routes: Arc<RouteRegistry>) -> Self {
        Self { routes }
    }
}

impl BreadcrumbBuilder for PathBasedBreadcrumbBuilder {
    fn build(&self, route_match: &RouteMatch) -> Breadcrumb {
        let cacheability = CacheMetadata::new().with_context(PATH_CONTEXT);

        if route_match.path == "/" {
            return Breadcrumb {
                links: Vec::new(),
                cacheability,
            };
        }

        let segments: Vec<&str> = route_match
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let mut links = vec![Link::new("Home", Url::front())];
        for end in 1..segments.len() {
            let ancestor = format!("/{}", segments[..end].join("/"));
            let Some(m) = self.routes.match_path(&ancestor) else {
                continue;
            };
            let Some(route) = self.routes.get(&m.route_name) else {
                continue;
            };
            if route.title.is_empty() {
                continue;
            }
            links.push(Link::new(route.title.clone(), Url::routed(m.route_name, m.path)));
        }

        Breadcrumb {
            links,
            cacheability,
        }
    }
}
