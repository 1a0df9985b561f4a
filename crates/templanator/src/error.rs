//! Error types for template engines.
//!
//! Every backend reports failures through [`EngineError`]. Nothing a backend
//! does is allowed to escape an engine call as anything other than this type:
//!
//! - `Template` - the template itself was rejected (bad syntax, unknown state,
//!   invalid regular expression)
//! - `Parse` - the template compiled but the input was rejected while parsing
//!   (for example a TextFSM `Error` action fired)
//! - `Render` - a text-substitution template failed to render
//! - `Context` - the render context (YAML/JSON source) could not be decoded
//!
//! The `Display` output of every variant is the bare message, so callers that
//! record the error text get exactly what the backend reported.
use thiserror::Error;

/// Result type alias using `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure reported by a template engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{message}")]
    Template { message: String },

    #[error("{message}")]
    Parse { message: String },

    #[error("{message}")]
    Render { message: String },

    #[error("{message}")]
    Context { message: String },
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        #[doc = concat!("Create a `", stringify!($variant), "` error")]
        pub fn $name<S: Into<String>>(message: S) -> Self {
            Self::$variant {
                message: message.into(),
            }
        }
    };
}

impl EngineError {
    error_constructor!(template, Template);
    error_constructor!(parse, Parse);
    error_constructor!(render, Render);
    error_constructor!(context, Context);

    /// The message reported by the backend, without any category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Template { message }
            | Self::Parse { message }
            | Self::Render { message }
            | Self::Context { message } => message,
        }
    }

    /// Short category label, used when a caller wants to prefix the message.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Template { .. } => "template",
            Self::Parse { .. } => "parse",
            Self::Render { .. } => "render",
            Self::Context { .. } => "context",
        }
    }
}
