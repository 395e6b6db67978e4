//! Overlay error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Errors that can occur while turning feed comments into overlay animations.
///
/// None of these are fatal to the scheduler: every failure path degrades to
/// skipping a single record, unit or notification.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// A feed record could not be interpreted (e.g. the body is not a string).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The presentation surface no longer has the addressed element.
    #[error("Render target not found: {0}")]
    MissingTarget(String),

    /// The receiving side of a channel has gone away.
    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),

    /// Configuration values are out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OverlayError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a missing render target error.
    pub fn missing_target(target: impl Into<String>) -> Self {
        Self::MissingTarget(target.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error only means the surface already dropped the element.
    pub fn is_missing_target(&self) -> bool {
        matches!(self, Self::MissingTarget(_))
    }
}
