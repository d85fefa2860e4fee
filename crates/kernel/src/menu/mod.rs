//! Menu system for navigation trees.
//!
//! Menus and their links live in a [`MenuRegistry`] built from the site
//! definition and provide:
//! - Tree loading with depth limits and active-trail marking
//! - Access checking and sorting manipulators
//! - Built items that tiles reshape into render trees

mod active_trail;
mod link;
mod registry;
mod tree;

pub use active_trail::{ACTIVE_TRAILS_CONTEXT, MenuActiveTrail};
pub use link::{Menu, MenuLink};
pub use registry::MenuRegistry;
pub use tree::{
    MenuBuild, MenuEntry, MenuItem, MenuLinkTree, MenuLinkTreeElement, MenuTreeParameters,
    PERMISSIONS_CONTEXT, TreeManipulator,
};
