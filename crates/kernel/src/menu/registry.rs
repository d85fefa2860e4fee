//! Menu registry - holds menus and their links.
//!
//! Links arrive from the site definition (or from tests) and are indexed by
//! menu and by parent so trees can be assembled without scanning.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use super::link::{Menu, MenuLink};

/// Registry of menus and menu links.
#[derive(Debug, Default)]
pub struct MenuRegistry {
    /// Menus indexed by machine name.
    menus: BTreeMap<String, Menu>,
    /// All links, indexed by id.
    links: HashMap<String, MenuLink>,
    /// Link ids organized by (menu, parent) for tree building.
    children: HashMap<(String, Option<String>), Vec<String>>,
}

impl MenuRegistry {
    /// Create an empty menu registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from menus and links, dropping links that point at
    /// unknown menus or parents.
    pub fn from_parts(menus: Vec<Menu>, links: Vec<MenuLink>) -> Self {
        let mut registry = Self::new();
        for menu in menus {
            registry.add_menu(menu);
        }
        for link in links {
            registry.add_link(link);
        }
        registry.prune_orphans();
        registry
    }

    /// Register a menu.
    pub fn add_menu(&mut self, menu: Menu) {
        self.menus.insert(menu.id.clone(), menu);
    }

    /// Register a link.
    pub fn add_link(&mut self, link: MenuLink) {
        if !self.menus.contains_key(&link.menu_name) {
            warn!(link = %link.id, menu = %link.menu_name, "link refers to unknown menu, skipping");
            return;
        }
        if self.links.contains_key(&link.id) {
            warn!(link = %link.id, "duplicate menu link id, replacing");
            self.remove_from_index(&link.id);
        }

        self.children
            .entry((link.menu_name.clone(), link.parent.clone()))
            .or_default()
            .push(link.id.clone());
        self.links.insert(link.id.clone(), link);
    }

    fn remove_from_index(&mut self, id: &str) {
        for ids in self.children.values_mut() {
            ids.retain(|existing| existing != id);
        }
    }

    /// Drop links whose parent is missing or lives in another menu.
    ///
    /// Repeats until stable since dropping a link orphans its children.
    fn prune_orphans(&mut self) {
        loop {
            let orphans: Vec<String> = self
                .links
                .values()
                .filter(|link| {
                    link.parent.as_ref().is_some_and(|parent| {
                        self.links
                            .get(parent)
                            .is_none_or(|p| p.menu_name != link.menu_name)
                    })
                })
                .map(|link| link.id.clone())
                .collect();

            if orphans.is_empty() {
                break;
            }

            for id in orphans {
                warn!(link = %id, "menu link parent not found, skipping");
                self.links.remove(&id);
                self.remove_from_index(&id);
            }
        }

        debug!(
            menus = self.menus.len(),
            links = self.links.len(),
            "built menu registry"
        );
    }

    /// Get a menu by machine name.
    pub fn menu(&self, id: &str) -> Option<&Menu> {
        self.menus.get(id)
    }

    /// All menus, ordered by label.
    pub fn load_multiple(&self) -> Vec<&Menu> {
        let mut menus: Vec<&Menu> = self.menus.values().collect();
        menus.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
        menus
    }

    /// Get a link by id.
    pub fn link(&self, id: &str) -> Option<&MenuLink> {
        self.links.get(id)
    }

    /// Children of a parent link within a menu (`None` = top level).
    pub fn children_of(&self, menu_name: &str, parent: Option<&str>) -> Vec<&MenuLink> {
        self.children
            .get(&(menu_name.to_string(), parent.map(String::from)))
            .map(|ids| ids.iter().filter_map(|id| self.links.get(id)).collect())
            .unwrap_or_default()
    }

    /// All links of a menu, in no particular order.
    pub fn links_in(&self, menu_name: &str) -> Vec<&MenuLink> {
        self.links
            .values()
            .filter(|l| l.menu_name == menu_name)
            .collect()
    }

    /// Ids of a link and all its ancestors, nearest first.
    pub fn lineage(&self, id: &str) -> Vec<String> {
        let mut lineage = Vec::new();
        let mut current = self.links.get(id);
        while let Some(link) = current {
            // Guard against cycles in hand-written site files
            if lineage.contains(&link.id) {
                warn!(link = %link.id, "cycle in menu link parents");
                break;
            }
            lineage.push(link.id.clone());
            current = link.parent.as_ref().and_then(|p| self.links.get(p));
        }
        lineage
    }

    /// Get menu count.
    pub fn len(&self) -> usize {
        self.menus.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn menu(id: &str, label: &str) -> Menu {
        Menu {
            id: id.into(),
            label: label.into(),
            description: String::new(),
        }
    }

    fn registry() -> MenuRegistry {
        MenuRegistry::from_parts(
            vec![menu("main", "Main navigation"), menu("footer", "Footer")],
            vec![
                MenuLink::new("about", "main", "About", "/about"),
                MenuLink::new("team", "main", "Team", "/about/team").parent("about"),
                MenuLink::new("history", "main", "History", "/about/history").parent("about"),
                MenuLink::new("stray", "main", "Stray", "/stray").parent("missing"),
                MenuLink::new("ghost", "nowhere", "Ghost", "/ghost"),
            ],
        )
    }

    #[test]
    fn registry_parent_child() {
        let registry = registry();
        assert_eq!(registry.children_of("main", Some("about")).len(), 2);
        assert_eq!(registry.children_of("main", None).len(), 1);
    }

    #[test]
    fn orphans_and_unknown_menus_are_dropped() {
        let registry = registry();
        assert!(registry.link("stray").is_none());
        assert!(registry.link("ghost").is_none());
        assert_eq!(registry.links_in("main").len(), 3);
    }

    #[test]
    fn load_multiple_sorts_by_label() {
        let registry = registry();
        let labels: Vec<_> = registry
            .load_multiple()
            .iter()
            .map(|m| m.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Footer", "Main navigation"]);
    }

    #[test]
    fn lineage_walks_up() {
        let registry = registry();
        assert_eq!(registry.lineage("team"), vec!["team", "about"]);
        assert!(registry.lineage("missing").is_empty());
    }
}
