//! Error types for the template harness
//!
//! Only setup problems surface as [`Error`]. Per-template problems (missing
//! fixture, unreadable file, engine failure) are classified into a
//! [`crate::RunOutcome`] instead and never abort a batch.

use std::path::PathBuf;
use templanator::{EngineError, RegistryError};
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or reporting a batch
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid TOML configuration file
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No template matched the configured prefix and extension
    #[error("No templates matching '{prefix}*' found in {}", dir.display())]
    DiscoveryEmpty { dir: PathBuf, prefix: String },

    /// A template filter matched nothing
    #[error("No template matching '{0}'")]
    TemplateNotFound(String),

    /// Engine mode label not registered
    #[error("{0}")]
    UnknownMode(String),

    /// Engine failure outside a batch (e.g. `inspect`)
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Error::UnknownMode(err.to_string())
    }
}

/// Render an error and its `source()` chain, one cause per line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
