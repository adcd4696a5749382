//! Error types for the configuration layer.

use thiserror::Error;

/// Configuration tree and parser errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A path traverses through a scalar setting as if it were a section.
    #[error("Structure conflict: {path} is a scalar setting, not a section")]
    StructureConflict {
        /// The offending path, segments joined with "=".
        path: String,
    },

    /// A line in the source text could not be parsed.
    #[error("Syntax error at line {line_num}: {line}")]
    Syntax { line_num: usize, line: String },
}

impl ConfigError {
    pub(crate) fn conflict(keys: &[&str]) -> Self {
        Self::StructureConflict {
            path: keys.join("="),
        }
    }
}
