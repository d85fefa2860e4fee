//! Host services shared by every tile.
//!
//! Built once per site and immutable afterwards; cloning is cheap.

use std::sync::Arc;

use crate::breadcrumb::{BreadcrumbBuilder, PathBasedBreadcrumbBuilder};
use crate::local_task::{LocalTaskDefinition, LocalTaskManager};
use crate::menu::{MenuActiveTrail, MenuLinkTree, MenuRegistry};
use crate::routing::RouteRegistry;
use crate::tap::TapRegistry;

/// Shared host services.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct HostServices {
    inner: Arc<HostServicesInner>,
}

struct HostServicesInner {
    /// Named routes.
    routes: Arc<RouteRegistry>,

    /// Menus and their links.
    menus: Arc<MenuRegistry>,

    /// Menu tree loader and builder.
    menu_tree: MenuLinkTree,

    /// Active trail resolver.
    active_trail: MenuActiveTrail,

    /// Local task (tab) manager.
    local_tasks: LocalTaskManager,

    /// Breadcrumb builder for the current route.
    breadcrumb: Arc<dyn BreadcrumbBuilder>,

    /// Alter taps.
    taps: TapRegistry,
}

impl HostServices {
    /// Wire the services from routes, menus and local task definitions.
    ///
    /// Breadcrumbs default to the path-based builder.
    pub fn new(
        routes: RouteRegistry,
        menus: MenuRegistry,
        local_tasks: Vec<LocalTaskDefinition>,
        taps: TapRegistry,
    ) -> Self {
        let routes = Arc::new(routes);
        let breadcrumb = Arc::new(PathBasedBreadcrumbBuilder::new(Arc::clone(&routes)));
        Self::with_breadcrumb(routes, menus, local_tasks, taps, breadcrumb)
    }

    /// Wire the services with a custom breadcrumb builder.
    pub fn with_breadcrumb(
        routes: Arc<RouteRegistry>,
        menus: MenuRegistry,
        local_tasks: Vec<LocalTaskDefinition>,
        taps: TapRegistry,
        breadcrumb: Arc<dyn BreadcrumbBuilder>,
    ) -> Self {
        let menus = Arc::new(menus);
        let menu_tree = MenuLinkTree::new(Arc::clone(&menus), Arc::clone(&routes));
        let active_trail = MenuActiveTrail::new(Arc::clone(&menus), Arc::clone(&routes));
        let local_tasks = LocalTaskManager::new(local_tasks, Arc::clone(&routes));

        Self {
            inner: Arc::new(HostServicesInner {
                routes,
                menus,
                menu_tree,
                active_trail,
                local_tasks,
                breadcrumb,
                taps,
            }),
        }
    }

    pub fn routes(&self) -> &RouteRegistry {
        &self.inner.routes
    }

    pub fn menus(&self) -> &MenuRegistry {
        &self.inner.menus
    }

    pub fn menu_tree(&self) -> &MenuLinkTree {
        &self.inner.menu_tree
    }

    pub fn active_trail(&self) -> &MenuActiveTrail {
        &self.inner.active_trail
    }

    pub fn local_tasks(&self) -> &LocalTaskManager {
        &self.inner.local_tasks
    }

    pub fn breadcrumb(&self) -> &dyn BreadcrumbBuilder {
        self.inner.breadcrumb.as_ref()
    }

    pub fn taps(&self) -> &TapRegistry {
        &self.inner.taps
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices")
            .field("routes", &self.inner.routes.len())
            .field("menu_links", &self.inner.menus.len())
            .finish()
    }
}
