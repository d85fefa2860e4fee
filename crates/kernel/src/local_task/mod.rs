//! Local tasks: the tabs shown on a page (View / Edit / Revisions ...).
//!
//! Tasks are grouped by a base route. Root tasks (no parent) form the
//! primary level; children of the active root form the secondary level,
//! and so on. A task is active when it points at the current route or one of
//! its descendants does.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use dom_bootstrap_sdk::render::{self, RenderElement};
use dom_bootstrap_sdk::types::{CacheMetadata, Cacheable};

use crate::menu::PERMISSIONS_CONTEXT;
use crate::permissions::UserContext;
use crate::routing::{RouteMatch, RouteRegistry};

/// Cache tag invalidated when local task definitions change.
pub const LOCAL_TASK_TAG: &str = "local_task";

/// Cache context for output that varies by route.
pub const ROUTE_CONTEXT: &str = "route";

/// Theme hook used for a single tab.
pub const LOCAL_TASK_THEME: &str = "menu_local_task";

/// A local task declared by the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalTaskDefinition {
    /// Unique identifier (e.g., "entity.node.edit_form").
    pub id: String,
    /// Tab label.
    pub title: String,
    /// Route the tab links to.
    pub route_name: String,
    /// Route grouping the tabs of one page family.
    pub base_route: String,
    /// Parent task for secondary tabs.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Sort weight (lower = first).
    #[serde(default)]
    pub weight: i32,
    /// Permission required to see the tab.
    #[serde(default)]
    pub permission: Option<String>,
}

/// Tabs of one level plus the cacheability they carry.
#[derive(Debug, Clone, Default)]
pub struct LocalTasks {
    /// Tab render elements keyed by task id.
    pub tabs: BTreeMap<String, RenderElement>,
    pub cacheability: CacheMetadata,
}

impl LocalTasks {
    /// Number of tabs the user may see.
    pub fn visible_count(&self) -> usize {
        self.tabs.values().filter(|t| t.is_accessible()).count()
    }
}

/// Collects local tasks for a route.
#[derive(Debug, Clone)]
pub struct LocalTaskManager {
    definitions: Vec<LocalTaskDefinition>,
    routes: Arc<RouteRegistry>,
}

impl LocalTaskManager {
    pub fn new(definitions: Vec<LocalTaskDefinition>, routes: Arc<RouteRegistry>) -> Self {
        let mut seen = BTreeSet::new();
        let definitions = definitions
            .into_iter()
            .filter(|d| {
                let fresh = seen.insert(d.id.clone());
                if !fresh {
                    warn!(task = %d.id, "duplicate local task id, keeping the first");
                }
                fresh
            })
            .collect();
        Self {
            definitions,
            routes,
        }
    }

    fn definition(&self, id: &str) -> Option<&LocalTaskDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Tasks on the active path for the route: the tasks pointing at the
    /// route and all their ancestors, root first.
    fn active_path(&self, route_name: &str) -> Vec<&LocalTaskDefinition> {
        let Some(current) = self
            .definitions
            .iter()
            .filter(|d| d.route_name == route_name)
            // The deepest matching task wins (a default child shares its parent's route)
            .max_by_key(|d| self.depth_of(d))
        else {
            return Vec::new();
        };

        let mut path = vec![current];
        let mut parent = current.parent_id.as_deref();
        while let Some(id) = parent {
            let Some(task) = self.definition(id) else {
                warn!(task = %id, "local task parent not found");
                break;
            };
            if path.iter().any(|t| t.id == task.id) {
                warn!(task = %id, "cycle in local task parents");
                break;
            }
            path.push(task);
            parent = task.parent_id.as_deref();
        }
        path.reverse();
        path
    }

    fn depth_of(&self, task: &LocalTaskDefinition) -> usize {
        let mut depth = 0;
        let mut parent = task.parent_id.as_deref();
        while let Some(id) = parent {
            depth += 1;
            if depth > self.definitions.len() {
                break;
            }
            parent = self.definition(id).and_then(|t| t.parent_id.as_deref());
        }
        depth
    }

    /// Tabs of `level` (0 = primary) for the current route.
    pub fn local_tasks(&self, route_match: &RouteMatch, level: usize, user: &UserContext) -> LocalTasks {
        let mut cacheability = self.cache_metadata().with_context(ROUTE_CONTEXT);

        let path = self.active_path(&route_match.route_name);
        let Some(root) = path.first() else {
            debug!(route = %route_match.route_name, "no local tasks for route");
            return LocalTasks {
                tabs: BTreeMap::new(),
                cacheability,
            };
        };
        let base_route = root.base_route.as_str();
        let active_ids: BTreeSet<&str> = path.iter().map(|t| t.id.as_str()).collect();

        // Level 0 are the roots; deeper levels are the children of the active task one level up
        let parent = match level {
            0 => None,
            n => match path.get(n - 1) {
                Some(task) => Some(task.id.as_str()),
                None => {
                    return LocalTasks {
                        tabs: BTreeMap::new(),
                        cacheability,
                    };
                }
            },
        };

        let mut tasks: Vec<&LocalTaskDefinition> = self
            .definitions
            .iter()
            .filter(|d| d.base_route == base_route && d.parent_id.as_deref() == parent)
            .collect();
        tasks.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.title.cmp(&b.title)));

        let mut tabs = BTreeMap::new();
        for (position, task) in tasks.into_iter().enumerate() {
            let url = match self.routes.url_for(&task.route_name, &route_match.params) {
                Ok(url) => url,
                Err(e) => {
                    warn!(task = %task.id, error = %e, "skipping local task");
                    continue;
                }
            };

            let access = match &task.permission {
                Some(permission) => {
                    cacheability.contexts.insert(PERMISSIONS_CONTEXT.to_string());
                    user.has_permission(permission)
                }
                None => true,
            };

            let active =
                task.route_name == route_match.route_name || active_ids.contains(task.id.as_str());

            let tab = render::theme(LOCAL_TASK_THEME)
                .var("link", json!({ "title": task.title, "url": url.to_string() }))
                .var("active", active)
                .weight(i32::try_from(position).unwrap_or(i32::MAX))
                .access(access)
                .build();
            tabs.insert(task.id.clone(), tab);
        }

        debug!(
            route = %route_match.route_name,
            level,
            tabs = tabs.len(),
            "collected local tasks"
        );

        LocalTasks { tabs, cacheability }
    }
}

impl Cacheable for LocalTaskManager {
    fn cache_metadata(&self) -> CacheMetadata {
        CacheMetadata::new().with_tag(LOCAL_TASK_TAG)
    }
}

/// Title of a tab element built by [`LocalTaskManager::local_tasks`].
pub fn tab_title(tab: &RenderElement) -> Option<&str> {
    tab.var("link")
        .and_then(|link| link.get("title"))
        .and_then(|title| title.as_str())
}

/// Whether a tab element is marked active.
pub fn tab_is_active(tab: &RenderElement) -> bool {
    tab.var("active").and_then(|a| a.as_bool()).unwrap_or(false)
}
