//! Error types for the processor layer.

use floret_shell::ShellError;
use thiserror::Error;

/// Why a processor failed.
#[derive(Error, Debug)]
pub enum ProcessorErrorKind {
    #[error("no processor registered for scheme '{scheme}'")]
    UnknownScheme { scheme: String },

    #[error("unbound variable: {name}")]
    UnboundVariable { name: String },

    #[error(transparent)]
    Command(#[from] ShellError),

    #[error("{0}")]
    Other(String),
}

/// A processor failure with the configuration context attached.
#[derive(Error, Debug)]
#[error("{}: {kind}", setting_id(.section, .key.as_deref(), .value.as_deref()))]
pub struct ProcessorError {
    /// The section being processed.
    pub section: String,
    /// The offending option within the section, if known.
    pub key: Option<String>,
    /// The offending value, if known.
    pub value: Option<String>,
    #[source]
    pub kind: ProcessorErrorKind,
}

impl ProcessorError {
    pub fn new(section: impl Into<String>, kind: ProcessorErrorKind) -> Self {
        ProcessorError {
            section: section.into(),
            key: None,
            value: None,
            kind,
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self.value = Some(value.into());
        self
    }
}

fn setting_id(section: &str, key: Option<&str>, value: Option<&str>) -> String {
    let mut id = section.to_string();
    if let Some(key) = key {
        id.push('=');
        id.push_str(key);
    }
    if let Some(value) = value {
        id.push('=');
        id.push_str(value);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_carries_full_context() {
        let err = ProcessorError::new(
            "env",
            ProcessorErrorKind::UnboundVariable {
                name: "HOME2".to_string(),
            },
        )
        .with_setting("PATH_EXTRA", "$HOME2/bin");
        assert_eq!(
            err.to_string(),
            "env=PATH_EXTRA=$HOME2/bin: unbound variable: HOME2"
        );
    }
}
