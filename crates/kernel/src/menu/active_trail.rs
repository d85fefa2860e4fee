//! Active trail resolution: which links of a menu lead to the current page.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::link::MenuLink;
use super::registry::MenuRegistry;
use crate::routing::{RouteMatch, RouteRegistry};

/// Cache context prefix for output that depends on a menu's active trail.
pub const ACTIVE_TRAILS_CONTEXT: &str = "route.menu_active_trails";

/// Resolves the active trail of a menu for the current route.
#[derive(Debug, Clone)]
pub struct MenuActiveTrail {
    menus: Arc<MenuRegistry>,
    routes: Arc<RouteRegistry>,
}

impl MenuActiveTrail {
    pub fn new(menus: Arc<MenuRegistry>, routes: Arc<RouteRegistry>) -> Self {
        Self { menus, routes }
    }

    /// Cache context for a menu's active trail.
    pub fn cache_context(menu_name: &str) -> String {
        format!("{ACTIVE_TRAILS_CONTEXT}:{menu_name}")
    }

    /// The link of `menu_name` that points at the current page.
    ///
    /// A link whose path equals the request path wins; otherwise a link to
    /// the same route with the same parameters. Ties go to the lightest,
    /// then alphabetically first, link id.
    pub fn active_link(&self, menu_name: &str, route_match: &RouteMatch) -> Option<&MenuLink> {
        let mut candidates: Vec<(u8, &MenuLink)> = self
            .menus
            .links_in(menu_name)
            .into_iter()
            .filter(|link| link.enabled)
            .filter_map(|link| {
                let url = link.url(&self.routes);
                if url.path == route_match.path {
                    Some((0, link))
                } else if link.route_name.as_deref() == Some(route_match.route_name.as_str())
                    && link.route_parameters == route_match.params
                {
                    Some((1, link))
                } else {
                    None
                }
            })
            .collect();

        candidates.sort_by(|(ra, a), (rb, b)| {
            ra.cmp(rb)
                .then_with(|| a.weight.cmp(&b.weight))
                .then_with(|| a.id.cmp(&b.id))
        });
        candidates.first().map(|(_, link)| *link)
    }

    /// Ids of the active link and its ancestors, plus the root marker `""`.
    pub fn active_trail_ids(&self, menu_name: &str, route_match: &RouteMatch) -> BTreeSet<String> {
        let mut trail = BTreeSet::from([String::new()]);
        if let Some(link) = self.active_link(menu_name, route_match) {
            trail.extend(self.menus.lineage(&link.id));
        }
        debug!(menu = %menu_name, route = %route_match.route_name, trail = ?trail, "resolved active trail");
        trail
    }
}
