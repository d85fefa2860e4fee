//! Tap dispatcher - invokes alter handlers in weight order.
//!
//! Each handler works on a copy of the build. A handler that fails is logged
//! and skipped, and its partial changes are discarded, so other extensions
//! continue from the last good state.

use tracing::{debug, error};

use super::{TAP_COLLAPSIBLE_MENU_ALTER, TapRegistry};
use crate::menu::MenuBuild;

impl TapRegistry {
    /// Let every `tap_collapsible_menu_alter` handler alter a menu build.
    ///
    /// Returns the number of handlers that succeeded.
    pub fn alter_collapsible_menu(&self, build: &mut MenuBuild) -> usize {
        let handlers = self.get_handlers(TAP_COLLAPSIBLE_MENU_ALTER);
        if handlers.is_empty() {
            debug!(tap = TAP_COLLAPSIBLE_MENU_ALTER, "no handlers registered for tap");
            return 0;
        }

        let mut applied = 0;
        for handler in handlers {
            let mut candidate = build.clone();
            match handler.handler.alter(&mut candidate) {
                Ok(()) => {
                    *build = candidate;
                    applied += 1;
                }
                Err(e) => {
                    error!(
                        extension = %handler.extension,
                        tap = TAP_COLLAPSIBLE_MENU_ALTER,
                        error = %e,
                        "tap invocation failed"
                    );
                }
            }
        }

        debug!(
            tap = TAP_COLLAPSIBLE_MENU_ALTER,
            menu = %build.menu_name,
            handlers = handlers.len(),
            applied,
            "dispatch complete"
        );

        applied
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use dom_bootstrap_sdk::types::{CacheMaxAge, CacheMetadata};

    use super::*;
    use crate::tap::MenuAlter;

    struct Permanent;

    impl MenuAlter for Permanent {
        fn alter(&self, build: &mut MenuBuild) -> anyhow::Result<()> {
            build.cache.max_age = CacheMaxAge::Permanent;
            Ok(())
        }
    }

    struct Broken;

    impl MenuAlter for Broken {
        fn alter(&self, build: &mut MenuBuild) -> anyhow::Result<()> {
            build.menu_name = "corrupted".into();
            anyhow::bail!("boom")
        }
    }

    fn empty_build() -> MenuBuild {
        MenuBuild {
            menu_name: "main".into(),
            items: Vec::new(),
            cache: CacheMetadata::new().with_max_age(CacheMaxAge::Seconds(0)),
        }
    }

    #[test]
    fn failing_handler_is_skipped_and_rolled_back() {
        let mut registry = TapRegistry::new();
        registry
            .register(TAP_COLLAPSIBLE_MENU_ALTER, "broken", 0, Arc::new(Broken))
            .unwrap();
        registry
            .register(TAP_COLLAPSIBLE_MENU_ALTER, "permanent", 1, Arc::new(Permanent))
            .unwrap();

        let mut build = empty_build();
        assert_eq!(registry.alter_collapsible_menu(&mut build), 1);
        assert_eq!(build.menu_name, "main");
        assert_eq!(build.cache.max_age, CacheMaxAge::Permanent);
    }

    #[test]
    fn no_handlers_leaves_build_untouched() {
        let registry = TapRegistry::new();
        let mut build = empty_build();
        assert_eq!(registry.alter_collapsible_menu(&mut build), 0);
        assert_eq!(build, empty_build());
    }
}
