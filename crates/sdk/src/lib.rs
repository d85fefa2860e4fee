//! DOM bootstrap SDK
//!
//! Value types shared between the tiles that build render trees and the
//! theme layer that consumes them. Tiles never produce raw HTML; they return
//! [`render::RenderElement`] trees carrying cache metadata.

pub mod render;
pub mod types;

// Re-export serde_json so callers can build theme variables without a direct dependency
#[doc(hidden)]
pub use serde_json;

pub mod prelude {
    pub use crate::render;
    pub use crate::render::RenderElement;
    pub use crate::types::*;
}
