//! DOM bootstrap kernel library
//!
//! Bootstrap presentation tiles (collapsible menu, tabs, text logo), the
//! host services they read from, and the theme layer that renders them.
//! The `dom-bootstrap` binary wraps this library in a command line.

pub mod breadcrumb;
pub mod cache;
pub mod config;
pub mod config_storage;
pub mod error;
pub mod form;
pub mod host;
pub mod local_task;
pub mod menu;
pub mod permissions;
pub mod routing;
pub mod site;
pub mod tap;
pub mod theme;
pub mod tile;

pub use error::{Error, Result};
