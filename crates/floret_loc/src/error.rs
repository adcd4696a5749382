//! Error types for the location layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocError {
    #[error("{name}: no handler can parse this location")]
    NoHandlerForLocation { name: String },

    #[error("{name}: not found")]
    NotFound { name: String },

    #[error("{name}: handler failed: {reason}")]
    HandlerInternal {
        name: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{name}: cannot pull before a successful parse")]
    NotParsed { name: String },

    #[error("{name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl LocError {
    pub fn not_found(name: impl Into<String>) -> Self {
        LocError::NotFound { name: name.into() }
    }

    pub fn internal(name: impl Into<String>, reason: impl Into<String>) -> Self {
        LocError::HandlerInternal {
            name: name.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn internal_with(
        name: impl Into<String>,
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        LocError::HandlerInternal {
            name: name.into(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        LocError::Io {
            name: name.into(),
            source,
        }
    }
}
