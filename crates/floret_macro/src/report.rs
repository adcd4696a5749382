//! Structured findings produced by macro runs.

use std::fmt;

/// One finding or change recorded by a macro.
///
/// Reports are immutable once created and collected in discovery order.
/// A warning report is informational; it never aborts processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Name of the producing macro, filled in by the engine.
    pub origin: String,
    /// Section path prefix the finding applies to.
    pub section: String,
    /// Option within the section, if any.
    pub option: Option<String>,
    /// The value that was examined or written, if any.
    pub value: Option<String>,
    /// Human-readable message.
    pub info: String,
    pub is_warning: bool,
}

impl Report {
    pub fn new(section: impl Into<String>, option: Option<&str>, value: Option<&str>) -> Self {
        Report {
            origin: String::new(),
            section: section.into(),
            option: option.map(str::to_string),
            value: value.map(str::to_string),
            info: String::new(),
            is_warning: false,
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn as_warning(mut self) -> Self {
        self.is_warning = true;
        self
    }

    /// The `section=option` identifier of the examined setting.
    pub fn setting_id(&self) -> String {
        match &self.option {
            Some(option) => format!("{}={}", self.section, option),
            None => self.section.clone(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_warning { "warn" } else { "info" };
        write!(f, "[{kind}] {}: {}", self.setting_id(), self.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_id_with_and_without_option() {
        let rep = Report::new("env", Some("FOO"), Some("1")).with_info("added");
        assert_eq!(rep.setting_id(), "env=FOO");
        let rep = Report::new("env", None, None).with_info("added");
        assert_eq!(rep.setting_id(), "env");
    }

    #[test]
    fn display_marks_warnings() {
        let rep = Report::new("env", Some("FOO"), None)
            .with_info("deprecated")
            .as_warning();
        assert_eq!(rep.to_string(), "[warn] env=FOO: deprecated");
    }
}
