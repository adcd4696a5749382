//! Macro engine for Floret configurations.
//!
//! A macro is a pluggable unit run against a configuration tree plus a
//! read-only metadata tree. Three capabilities exist: a [`Validator`]
//! inspects and reports, a [`Transformer`] mutates and reports, and an
//! [`Upgrader`] is a transformer bound to a `(before, after)` version tag
//! pair so that a contiguous chain of upgraders can carry a configuration
//! from one version to another.
//!
//! The engine is handed fixed, pre-resolved plugin instances; it performs
//! no discovery of its own. Every invocation gets a fresh report
//! collector and every [`Report`] is tagged with the producing macro's
//! name.

mod args;
mod editor;
mod engine;
mod error;
mod report;
mod upgrade;

pub use args::{ArgValue, MacroArgs};
pub use editor::MacroEditor;
pub use engine::{MacroEngine, Transformer, Validator};
pub use error::MacroError;
pub use report::Report;
pub use upgrade::{resolve_chain, UpgradeRunner, Upgrader};

/// Operation result type for the macro layer.
pub type Result<T> = std::result::Result<T, MacroError>;
