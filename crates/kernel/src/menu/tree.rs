//! Menu link tree: loading, manipulating and building menu trees.
//!
//! Loading walks the registry from the top level down to the requested depth
//! and marks the active trail. Manipulators then check access and sort
//! siblings. Building turns the tree into a [`MenuBuild`]: plain items plus
//! the cache metadata the menu contributes.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use dom_bootstrap_sdk::types::{AccessResult, CacheMetadata, Url};

use super::link::{Menu, MenuLink};
use super::registry::MenuRegistry;
use crate::permissions::UserContext;
use crate::routing::RouteRegistry;

/// Cache context that varies output by the user's permission set.
pub const PERMISSIONS_CONTEXT: &str = "user.permissions";

/// Parameters controlling which part of a menu is loaded.
#[derive(Debug, Clone, Default)]
pub struct MenuTreeParameters {
    /// Link ids in the active trail (the empty string stands for the root).
    pub active_trail: BTreeSet<String>,
    /// First depth to include (1 = top level).
    pub min_depth: Option<usize>,
    /// Last depth to include.
    pub max_depth: Option<usize>,
}

impl MenuTreeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active_trail(mut self, trail: BTreeSet<String>) -> Self {
        self.active_trail = trail;
        self
    }

    pub fn set_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn set_min_depth(mut self, depth: usize) -> Self {
        self.min_depth = Some(depth.max(1));
        self
    }
}

/// One link in a loaded menu tree.
#[derive(Debug, Clone)]
pub struct MenuLinkTreeElement {
    pub link: MenuLink,
    /// 1 for top-level links.
    pub depth: usize,
    pub in_active_trail: bool,
    /// Whether the link has enabled children, loaded or not.
    pub has_children: bool,
    /// Set by the access manipulator; `None` means unchecked.
    pub access: Option<AccessResult>,
    pub subtree: Vec<MenuLinkTreeElement>,
}

/// Transformations applied to a loaded tree before building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeManipulator {
    /// Evaluate link permissions for the current user.
    CheckAccess,
    /// Sort siblings by weight, then title, then id.
    GenerateIndexAndSort,
}

/// A built menu item ready to be reshaped by a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    /// Key of the item (the link id).
    pub key: String,
    pub title: String,
    pub url: Url,
    pub attributes: Map<String, Value>,
    pub in_active_trail: bool,
    /// Has children and they were loaded.
    pub is_expanded: bool,
    /// Has children but they were not loaded.
    pub is_collapsed: bool,
    pub below: Vec<MenuEntry>,
    /// The link this item came from.
    pub original_link: MenuLink,
}

/// An entry of a built menu: a link item or a delimiter marker injected by
/// an alter tap.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuEntry {
    Item(MenuItem),
    Delimiter { key: String },
}

impl MenuEntry {
    pub fn delimiter(key: impl Into<String>) -> Self {
        Self::Delimiter { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Item(item) => &item.key,
            Self::Delimiter { key } => key,
        }
    }

    pub fn as_item(&self) -> Option<&MenuItem> {
        match self {
            Self::Item(item) => Some(item),
            Self::Delimiter { .. } => None,
        }
    }

    pub fn as_item_mut(&mut self) -> Option<&mut MenuItem> {
        match self {
            Self::Item(item) => Some(item),
            Self::Delimiter { .. } => None,
        }
    }
}

/// The output of [`MenuLinkTree::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct MenuBuild {
    pub menu_name: String,
    pub items: Vec<MenuEntry>,
    pub cache: CacheMetadata,
}

/// Service that loads, transforms and builds menu trees.
#[derive(Debug, Clone)]
pub struct MenuLinkTree {
    menus: Arc<MenuRegistry>,
    routes: Arc<RouteRegistry>,
}

impl MenuLinkTree {
    pub fn new(menus: Arc<MenuRegistry>, routes: Arc<RouteRegistry>) -> Self {
        Self { menus, routes }
    }

    /// Load the enabled links of a menu as a tree.
    ///
    /// An unknown menu loads as an empty tree.
    pub fn load(&self, menu_name: &str, params: &MenuTreeParameters) -> Vec<MenuLinkTreeElement> {
        if self.menus.menu(menu_name).is_none() {
            debug!(menu = %menu_name, "menu not found, loading empty tree");
            return Vec::new();
        }

        let tree = self.load_level(menu_name, None, 1, params);

        let min_depth = params.min_depth.unwrap_or(1);
        if min_depth > 1 {
            return descend(tree, min_depth);
        }
        tree
    }

    fn load_level(
        &self,
        menu_name: &str,
        parent: Option<&str>,
        depth: usize,
        params: &MenuTreeParameters,
    ) -> Vec<MenuLinkTreeElement> {
        self.menus
            .children_of(menu_name, parent)
            .into_iter()
            .filter(|link| link.enabled)
            .map(|link| {
                let has_children = self
                    .menus
                    .children_of(menu_name, Some(&link.id))
                    .iter()
                    .any(|child| child.enabled);

                let within_depth = params.max_depth.is_none_or(|max| depth < max);
                let subtree = if has_children && within_depth {
                    self.load_level(menu_name, Some(&link.id), depth + 1, params)
                } else {
                    Vec::new()
                };

                MenuLinkTreeElement {
                    link: link.clone(),
                    depth,
                    in_active_trail: params.active_trail.contains(&link.id),
                    has_children,
                    access: None,
                    subtree,
                }
            })
            .collect()
    }

    /// Apply manipulators in order.
    pub fn transform(
        &self,
        tree: Vec<MenuLinkTreeElement>,
        manipulators: &[TreeManipulator],
        user: &UserContext,
    ) -> Vec<MenuLinkTreeElement> {
        manipulators
            .iter()
            .fold(tree, |tree, manipulator| match manipulator {
                TreeManipulator::CheckAccess => check_access(tree, user),
                TreeManipulator::GenerateIndexAndSort => sort_tree(tree),
            })
    }

    /// Build a tree into render-ready items.
    ///
    /// Links denied by the access manipulator are skipped. When any access
    /// result was computed the build varies by the user's permissions.
    pub fn build(&self, menu_name: &str, tree: &[MenuLinkTreeElement]) -> MenuBuild {
        let mut cache = CacheMetadata::new().with_tag(Menu::cache_tag(menu_name));
        let mut access_checked = false;
        let items = self.build_items(tree, &mut access_checked);
        if access_checked {
            cache.contexts.insert(PERMISSIONS_CONTEXT.to_string());
        }

        MenuBuild {
            menu_name: menu_name.to_string(),
            items,
            cache,
        }
    }

    fn build_items(&self, tree: &[MenuLinkTreeElement], access_checked: &mut bool) -> Vec<MenuEntry> {
        let mut items = Vec::with_capacity(tree.len());
        for element in tree {
            if let Some(access) = element.access {
                *access_checked = true;
                if !access.is_allowed() {
                    continue;
                }
            }

            let below = self.build_items(&element.subtree, access_checked);
            items.push(MenuEntry::Item(MenuItem {
                key: element.link.id.clone(),
                title: element.link.title.clone(),
                url: element.link.url(&self.routes),
                attributes: element.link.attributes.clone(),
                in_active_trail: element.in_active_trail,
                is_expanded: element.has_children && !element.subtree.is_empty(),
                is_collapsed: element.has_children && element.subtree.is_empty(),
                below,
                original_link: element.link.clone(),
            }));
        }
        items
    }
}

/// Keep only the part of the tree at or below `min_depth`.
fn descend(tree: Vec<MenuLinkTreeElement>, min_depth: usize) -> Vec<MenuLinkTreeElement> {
    tree.into_iter()
        .flat_map(|element| {
            if element.depth >= min_depth {
                vec![element]
            } else {
                descend(element.subtree, min_depth)
            }
        })
        .collect()
}

/// Evaluate access for every link. Denied links lose their subtree and are
/// dropped at build time.
///
/// A loaded parent whose children are all denied no longer has children.
/// Parents cut off by the depth limit keep their flag, since their children
/// were never checked.
fn check_access(tree: Vec<MenuLinkTreeElement>, user: &UserContext) -> Vec<MenuLinkTreeElement> {
    tree.into_iter()
        .map(|mut element| {
            let access = element
                .access
                .unwrap_or_else(|| link_access(&element.link, user));
            element.access = Some(access);
            if !access.is_allowed() {
                element.subtree = Vec::new();
                element.has_children = false;
                return element;
            }
            if !element.subtree.is_empty() {
                element.subtree = check_access(element.subtree, user);
                element.has_children = element
                    .subtree
                    .iter()
                    .any(|child| child.access.is_none_or(AccessResult::is_allowed));
            }
            element
        })
        .collect()
}

fn link_access(link: &MenuLink, user: &UserContext) -> AccessResult {
    match &link.permission {
        Some(permission) => AccessResult::allowed_if(user.has_permission(permission)),
        None => AccessResult::Allowed,
    }
}

fn sort_tree(mut tree: Vec<MenuLinkTreeElement>) -> Vec<MenuLinkTreeElement> {
    tree.sort_by(|a, b| {
        a.link
            .weight
            .cmp(&b.link.weight)
            .then_with(|| a.link.title.cmp(&b.link.title))
            .then_with(|| a.link.id.cmp(&b.link.id))
    });
    tree.into_iter()
        .map(|mut element| {
            element.subtree = sort_tree(std::mem::take(&mut element.subtree));
            element
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn tree_service() -> MenuLinkTree {
        let menus = MenuRegistry::from_parts(
            vec![Menu {
                id: "main".into(),
                label: "Main".into(),
                description: String::new(),
            }],
            vec![
                MenuLink::new("news", "main", "News", "/news").weight(5),
                MenuLink::new("about", "main", "About", "/about"),
                MenuLink::new("team", "main", "Team", "/about/team").parent("about"),
                MenuLink::new("alumni", "main", "Alumni", "/about/team/alumni").parent("team"),
                MenuLink::new("admin", "main", "Admin", "/admin").permission("administer menu"),
                MenuLink::new("tools", "main", "Tools", "/admin/tools")
                    .parent("admin"),
                MenuLink::new("hidden", "main", "Hidden", "/hidden").disabled(),
            ],
        );
        MenuLinkTree::new(Arc::new(menus), Arc::new(RouteRegistry::new()))
    }

    fn ids(tree: &[MenuLinkTreeElement]) -> Vec<&str> {
        tree.iter().map(|e| e.link.id.as_str()).collect()
    }

    #[test]
    fn load_truncates_at_max_depth() {
        let service = tree_service();
        let tree = service.load("main", &MenuTreeParameters::new().set_max_depth(2));
        let about = tree.iter().find(|e| e.link.id == "about").unwrap();
        let team = &about.subtree[0];
        assert_eq!(team.depth, 2);
        assert!(team.has_children);
        assert!(team.subtree.is_empty());
    }

    #[test]
    fn load_skips_disabled_links() {
        let service = tree_service();
        let tree = service.load("main", &MenuTreeParameters::new());
        assert!(!ids(&tree).contains(&"hidden"));
    }

    #[test]
    fn load_unknown_menu_is_empty() {
        let service = tree_service();
        assert!(service.load("nope", &MenuTreeParameters::new()).is_empty());
    }

    #[test]
    fn active_trail_is_marked() {
        let service = tree_service();
        let trail = BTreeSet::from(["".to_string(), "about".to_string(), "team".to_string()]);
        let tree = service.load("main", &MenuTreeParameters::new().set_active_trail(trail));
        let about = tree.iter().find(|e| e.link.id == "about").unwrap();
        assert!(about.in_active_trail);
        assert!(about.subtree[0].in_active_trail);
        let news = tree.iter().find(|e| e.link.id == "news").unwrap();
        assert!(!news.in_active_trail);
    }

    #[test]
    fn sort_orders_by_weight_then_title() {
        let service = tree_service();
        let tree = service.load("main", &MenuTreeParameters::new());
        let user = UserContext::anonymous();
        let sorted = service.transform(tree, &[TreeManipulator::GenerateIndexAndSort], &user);
        assert_eq!(ids(&sorted), vec!["about", "admin", "news"]);
    }

    #[test]
    fn access_check_hides_links_at_build() {
        let service = tree_service();
        let tree = service.load("main", &MenuTreeParameters::new().set_max_depth(2));
        let user = UserContext::anonymous();
        let tree = service.transform(
            tree,
            &[TreeManipulator::CheckAccess, TreeManipulator::GenerateIndexAndSort],
            &user,
        );
        let admin = tree.iter().find(|e| e.link.id == "admin").unwrap();
        assert_eq!(admin.access, Some(AccessResult::Neutral));
        assert!(admin.subtree.is_empty());

        let build = service.build("main", &tree);
        let keys: Vec<_> = build.items.iter().map(MenuEntry::key).collect();
        assert_eq!(keys, vec!["about", "news"]);
        assert!(build.cache.tags.contains("config:system.menu.main"));
        assert!(build.cache.contexts.contains(PERMISSIONS_CONTEXT));
    }

    #[test]
    fn build_flags_expanded_and_collapsed() {
        let service = tree_service();
        let tree = service.load("main", &MenuTreeParameters::new().set_max_depth(2));
        let build = service.build("main", &tree);
        assert!(!build.cache.contexts.contains(PERMISSIONS_CONTEXT));

        let about = build
            .items
            .iter()
            .filter_map(MenuEntry::as_item)
            .find(|i| i.key == "about")
            .unwrap();
        assert!(about.is_expanded);
        let team = about.below[0].as_item().unwrap();
        assert!(team.is_collapsed);
        assert!(!team.is_expanded);
    }

    #[test]
    fn min_depth_starts_below_top_level() {
        let service = tree_service();
        let tree = service.load("main", &MenuTreeParameters::new().set_min_depth(2));
        assert_eq!(ids(&tree), vec!["team", "tools"]);
    }

    #[test]
    fn access_check_clears_children_when_all_denied() {
        let menus = MenuRegistry::from_parts(
            vec![Menu {
                id: "main".into(),
                label: "Main".into(),
                description: String::new(),
            }],
            vec![
                MenuLink::new("reports", "main", "Reports", "/reports"),
                MenuLink::new("logs", "main", "Logs", "/reports/logs")
                    .parent("reports")
                    .permission("view site reports"),
            ],
        );
        let service = MenuLinkTree::new(Arc::new(menus), Arc::new(RouteRegistry::new()));
        let tree = service.load("main", &MenuTreeParameters::new().set_max_depth(2));
        assert!(tree[0].has_children);

        let user = UserContext::anonymous();
        let tree = service.transform(tree, &[TreeManipulator::CheckAccess], &user);
        assert!(!tree[0].has_children);

        let build = service.build("main", &tree);
        let reports = build.items[0].as_item().unwrap();
        assert!(reports.below.is_empty());
        assert!(!reports.is_expanded);
        assert!(!reports.is_collapsed);

        // With the permission the child stays
        let admin = UserContext::authenticated("admin", vec![], vec!["view site reports".into()]);
        let tree = service.load("main", &MenuTreeParameters::new().set_max_depth(2));
        let tree = service.transform(tree, &[TreeManipulator::CheckAccess], &admin);
        assert!(tree[0].has_children);
        let build = service.build("main", &tree);
        assert!(build.items[0].as_item().unwrap().is_expanded);
    }

    #[test]
    fn access_check_keeps_children_beyond_depth() {
        let service = tree_service();
        let tree = service.load("main", &MenuTreeParameters::new().set_max_depth(2));
        let user = UserContext::anonymous();
        let tree = service.transform(tree, &[TreeManipulator::CheckAccess], &user);
        let about = tree.iter().find(|e| e.link.id == "about").unwrap();
        assert!(about.has_children);
        // Team's children were never loaded, so the flag is left alone
        assert!(about.subtree[0].has_children);
    }
}
