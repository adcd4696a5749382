//! Error types for the macro layer.

use floret_config::ConfigError;
use thiserror::Error;

/// Macro execution and upgrade chain errors.
#[derive(Error, Debug)]
pub enum MacroError {
    /// A user supplied a parameter the macro does not declare.
    #[error("Macro {macro_name} does not accept argument '{arg}'")]
    UnsupportedArgument { macro_name: String, arg: String },

    /// No contiguous upgrader chain connects the two version tags.
    #[error("No upgrade path from {from_tag} to {to_tag}")]
    NoUpgradePath { from_tag: String, to_tag: String },

    /// More than one upgrader claims the same starting tag.
    #[error("Ambiguous upgrade path: multiple upgraders start at {tag}")]
    AmbiguousUpgradePath { tag: String },

    /// A requested macro is not registered.
    #[error("No such macro: {macro_name}")]
    NotFound { macro_name: String },

    /// Structural error raised while a macro edited the tree.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A macro reported its own failure.
    #[error("Macro {macro_name} failed: {reason}")]
    Failure { macro_name: String, reason: String },
}
