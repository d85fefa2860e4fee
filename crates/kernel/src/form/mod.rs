//! Form API for tile configuration.
//!
//! Tiles describe their settings as declarative forms. Submissions are
//! collected into a [`FormState`] and checked by [`validate_form`] before the
//! tile sees them.

mod service;
mod types;

pub use service::{FormState, ValidationError, validate_form};
pub use types::{ElementType, Form, FormElement};
