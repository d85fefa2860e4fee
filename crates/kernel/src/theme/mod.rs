//! Theme engine and template rendering.
//!
//! Provides Tera-based template rendering with template suggestion resolution
//! and RenderElement to HTML conversion.

mod engine;
mod render;

pub use engine::{SharedThemeEngine, ThemeEngine};
pub use render::{RenderTreeConsumer, dom_id, html_escape, render_attributes};
