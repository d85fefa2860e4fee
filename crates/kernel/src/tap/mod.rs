//! Tap system for extension points.
//!
//! Taps are named extension points that extensions can implement. When a tap is invoked,
//! all handlers that implement it are called in weight order (lower = higher priority).

mod delimiter;
mod dispatcher;
mod registry;

pub use delimiter::{DelimiterRule, DelimiterTap};
pub use registry::{TapError, TapHandler, TapRegistry};

use crate::menu::MenuBuild;

/// Alter tap for the collapsible menu build, run before it is reshaped.
pub const TAP_COLLAPSIBLE_MENU_ALTER: &str = "tap_collapsible_menu_alter";

/// Every tap name an extension may implement.
pub const VALID_TAPS: &[&str] = &[TAP_COLLAPSIBLE_MENU_ALTER];

/// Handler for `tap_collapsible_menu_alter`.
///
/// Handlers may insert [`crate::menu::MenuEntry::Delimiter`] markers into item
/// children and adjust the build's cache metadata.
pub trait MenuAlter: Send + Sync {
    fn alter(&self, build: &mut MenuBuild) -> anyhow::Result<()>;
}
