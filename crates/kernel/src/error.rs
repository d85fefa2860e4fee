//! Kernel error types.

use thiserror::Error;

use crate::form::ValidationError;
use crate::tap::TapError;

/// Errors raised while configuring or building tiles.
#[derive(Debug, Error)]
pub enum Error {
    /// No tile plugin is registered under this id.
    #[error("unknown tile type '{0}'")]
    UnknownTile(String),

    /// A tile placement with this machine name does not exist.
    #[error("tile placement '{0}' not found")]
    PlacementNotFound(String),

    /// Stored or submitted settings did not match the tile's schema.
    #[error("invalid settings for tile '{tile}': {source}")]
    InvalidSettings {
        tile: String,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration form submission failed validation.
    #[error("form '{form_id}' failed validation: {}", format_errors(.errors))]
    Validation {
        form_id: String,
        errors: Vec<ValidationError>,
    },

    /// A route name was referenced that the router does not know.
    #[error("unknown route '{0}'")]
    UnknownRoute(String),

    /// An extension tried to implement a tap that does not exist.
    #[error(transparent)]
    Tap(#[from] TapError),

    /// Configuration storage failure.
    #[error("config storage: {0}")]
    Storage(#[from] anyhow::Error),

    /// Rendering a tile's output failed.
    #[error("render failed: {0:#}")]
    Render(#[source] anyhow::Error),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
