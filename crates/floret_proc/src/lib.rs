//! Scheme-dispatched processors for configuration sections.
//!
//! A [`Processor`] owns a scheme ("env", "jinja2", ...) and is invoked
//! for every enabled top-level section whose key equals the scheme or
//! starts with `scheme:`. Dispatch order is the ascending lexical order
//! of section keys, so cross-section side effects are reproducible
//! regardless of how the tree was assembled.
//!
//! Processors describe their side effects as values where possible: the
//! env processor emits an [`EnvExport`] instead of touching the process
//! environment, and a single boundary function applies it.

mod context;
mod dispatch;
mod env;
mod error;

pub use context::ProcessContext;
pub use dispatch::{DispatchOutcome, FailureMode, Processor, ProcessorRegistry};
pub use env::{apply_env_export, EnvExport, EnvProcessor};
pub use error::{ProcessorError, ProcessorErrorKind};

/// Operation result type for the processor layer.
pub type Result<T> = std::result::Result<T, ProcessorError>;
