//! Built-in alter handler that places delimiters between menu children.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dom_bootstrap_sdk::types::CacheMaxAge;

use super::MenuAlter;
use crate::menu::{MenuBuild, MenuEntry};

/// Insert a delimiter in front of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterRule {
    /// Menu the rule applies to.
    pub menu: String,
    /// Link id the delimiter is placed before.
    pub before: String,
}

/// Adds delimiter markers to collapsible menus from configured rules.
///
/// Menus the tap touches are marked cacheable until their tags are
/// invalidated.
#[derive(Debug, Clone, Default)]
pub struct DelimiterTap {
    rules: Vec<DelimiterRule>,
}

impl DelimiterTap {
    pub fn new(rules: Vec<DelimiterRule>) -> Self {
        Self { rules }
    }
}

impl MenuAlter for DelimiterTap {
    fn alter(&self, build: &mut MenuBuild) -> anyhow::Result<()> {
        let mut touched = false;
        for rule in self.rules.iter().filter(|r| r.menu == build.menu_name) {
            touched = true;
            if insert_before(&mut build.items, &rule.before) {
                debug!(menu = %rule.menu, before = %rule.before, "inserted delimiter");
            } else {
                warn!(menu = %rule.menu, before = %rule.before, "delimiter target not in menu");
            }
        }
        if touched {
            build.cache.max_age = CacheMaxAge::Permanent;
        }
        Ok(())
    }
}

fn insert_before(entries: &mut Vec<MenuEntry>, target: &str) -> bool {
    if let Some(index) = entries.iter().position(|e| e.key() == target) {
        entries.insert(index, MenuEntry::delimiter(format!("delimiter_{target}")));
        return true;
    }
    entries
        .iter_mut()
        .filter_map(MenuEntry::as_item_mut)
        .any(|item| insert_before(&mut item.below, target))
}
