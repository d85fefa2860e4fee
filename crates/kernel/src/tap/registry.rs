//! Tap registry - indexes which extensions implement which taps.
//!
//! The registry maps tap names to an ordered list of handlers.
//! Handlers are sorted by weight (lower = higher priority, called first).

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::{MenuAlter, VALID_TAPS};

/// Errors raised while registering tap handlers.
#[derive(Debug, Error)]
pub enum TapError {
    /// Extension declares a tap that doesn't exist.
    #[error("extension '{extension}': declares unknown tap '{tap}'. Valid taps: {valid_taps}")]
    UnknownTap {
        extension: String,
        tap: String,
        valid_taps: String,
    },
}

/// A registered tap handler with its owner and priority.
#[derive(Clone)]
pub struct TapHandler {
    /// The extension that implements this tap.
    pub extension: String,
    /// Weight for ordering (lower = higher priority).
    pub weight: i32,
    /// The alter callback.
    pub handler: Arc<dyn MenuAlter>,
}

impl std::fmt::Debug for TapHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapHandler")
            .field("extension", &self.extension)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Registry mapping tap names to ordered handlers.
///
/// When a tap is invoked, handlers are called in weight order.
/// Multiple extensions can implement the same tap.
#[derive(Debug, Default)]
pub struct TapRegistry {
    /// Map from tap name to ordered list of handlers.
    handlers: HashMap<String, Vec<TapHandler>>,
}

impl TapRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a tap.
    ///
    /// Handlers with equal weight keep registration order.
    pub fn register(
        &mut self,
        tap_name: &str,
        extension: impl Into<String>,
        weight: i32,
        handler: Arc<dyn MenuAlter>,
    ) -> Result<(), TapError> {
        let extension = extension.into();
        if !VALID_TAPS.contains(&tap_name) {
            return Err(TapError::UnknownTap {
                extension,
                tap: tap_name.to_string(),
                valid_taps: VALID_TAPS.join(", "),
            });
        }

        let list = self.handlers.entry(tap_name.to_string()).or_default();
        list.push(TapHandler {
            extension,
            weight,
            handler,
        });
        list.sort_by_key(|h| h.weight);
        Ok(())
    }

    /// Get handlers for a tap, in weight order.
    ///
    /// Returns an empty slice if nothing implements the tap.
    pub fn get_handlers(&self, tap_name: &str) -> &[TapHandler] {
        self.handlers
            .get(tap_name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Check if any extension implements a tap.
    pub fn has_tap(&self, tap_name: &str) -> bool {
        self.handlers
            .get(tap_name)
            .is_some_and(|handlers| !handlers.is_empty())
    }

    /// Get the count of handlers for a tap.
    pub fn handler_count(&self, tap_name: &str) -> usize {
        self.handlers.get(tap_name).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::menu::MenuBuild;
    use crate::tap::TAP_COLLAPSIBLE_MENU_ALTER;

    struct Noop;

    impl MenuAlter for Noop {
        fn alter(&self, _build: &mut MenuBuild) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn registry_unknown_tap_returns_empty() {
        let registry = TapRegistry::new();
        assert!(!registry.has_tap("nonexistent_tap"));
        assert!(registry.get_handlers("nonexistent_tap").is_empty());
        assert_eq!(registry.handler_count("nonexistent_tap"), 0);
    }

    #[test]
    fn registry_orders_by_weight() {
        let mut registry = TapRegistry::new();
        registry
            .register(TAP_COLLAPSIBLE_MENU_ALTER, "late", 10, Arc::new(Noop))
            .unwrap();
        registry
            .register(TAP_COLLAPSIBLE_MENU_ALTER, "early", -5, Arc::new(Noop))
            .unwrap();
        registry
            .register(TAP_COLLAPSIBLE_MENU_ALTER, "middle", 0, Arc::new(Noop))
            .unwrap();

        let order: Vec<_> = registry
            .get_handlers(TAP_COLLAPSIBLE_MENU_ALTER)
            .iter()
            .map(|h| h.extension.as_str())
            .collect();
        assert_eq!(order, vec!["early", "middle", "late"]);
        assert!(registry.has_tap(TAP_COLLAPSIBLE_MENU_ALTER));
    }

    #[test]
    fn registry_rejects_unknown_tap() {
        let mut registry = TapRegistry::new();
        let err = registry
            .register("tap_nope", "ext", 0, Arc::new(Noop))
            .unwrap_err();
        assert!(err.to_string().contains("tap_collapsible_menu_alter"));
    }
}
