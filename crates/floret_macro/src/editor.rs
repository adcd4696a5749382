//! Report-recording edit helpers for transformer and upgrader macros.

use crate::report::Report;
use crate::Result;
use floret_config::{ConfigNode, NodeState};

/// Wraps a mutable configuration tree and records a [`Report`] for every
/// change actually made.
///
/// Every mutator returns whether it changed anything: adding a setting
/// that already exists, removing an absent one or re-applying a value is
/// a no-op, which keeps upgrader macros idempotent at their fixed point.
pub struct MacroEditor<'a> {
    config: &'a mut ConfigNode,
    reports: Vec<Report>,
}

impl<'a> MacroEditor<'a> {
    pub fn new(config: &'a mut ConfigNode) -> Self {
        MacroEditor {
            config,
            reports: Vec::new(),
        }
    }

    /// Consume the editor, yielding the recorded reports.
    pub fn into_reports(self) -> Vec<Report> {
        self.reports
    }

    /// Value of a setting, `None` if absent or ignored.
    pub fn get_setting_value(&self, keys: &[&str]) -> Option<&str> {
        self.config.get_value(keys)
    }

    /// Add a setting if it does not already exist.
    pub fn add_setting(&mut self, keys: &[&str], value: Option<&str>) -> Result<bool> {
        if self.config.get(keys)?.is_some() {
            return Ok(false);
        }
        self.config.set(keys, value, Some(NodeState::Normal))?;
        let info = match value {
            Some(value) => format!("Added with value '{value}'"),
            None => "Added".to_string(),
        };
        self.report(keys, value, info);
        Ok(true)
    }

    /// Change the value of an existing scalar setting.
    pub fn change_setting_value(&mut self, keys: &[&str], value: &str) -> Result<bool> {
        let Some(node) = self.config.get_mut(keys)? else {
            return Ok(false);
        };
        let Some(old) = node.as_scalar().map(str::to_string) else {
            return Ok(false);
        };
        if old == value {
            return Ok(false);
        }
        self.config.set(keys, Some(value), None)?;
        self.report(keys, Some(value), format!("Value: '{old}' -> '{value}'"));
        Ok(true)
    }

    /// Remove a setting or section, if present.
    pub fn remove_setting(&mut self, keys: &[&str]) -> Result<bool> {
        if self.config.unset(keys).is_none() {
            return Ok(false);
        }
        self.report(keys, None, "Removed".to_string());
        Ok(true)
    }

    /// Move a setting to a new path, carrying value, state and comments.
    pub fn rename_setting(&mut self, keys: &[&str], new_keys: &[&str]) -> Result<bool> {
        let Some(node) = self.config.unset(keys) else {
            return Ok(false);
        };
        let value = node.as_scalar().map(str::to_string);
        let target = self
            .config
            .set(new_keys, value.as_deref(), Some(node.state))?;
        target.comments = node.comments.clone();
        if value.is_none() {
            // A whole section: carry the children across too.
            target.value = node.value.clone();
        }
        self.report(
            new_keys,
            value.as_deref(),
            format!("Renamed {} -> {}", keys.join("="), new_keys.join("=")),
        );
        Ok(true)
    }

    /// Promote a user-ignored setting back to normal.
    ///
    /// System-ignored settings are left untouched: that state belongs to
    /// machinery, not to users, and clearing it here would be silent
    /// corruption.
    pub fn enable_setting(&mut self, keys: &[&str]) -> Result<bool> {
        self.set_ignored_state(keys, NodeState::Normal)
    }

    /// User-ignore a normal setting.
    pub fn ignore_setting(&mut self, keys: &[&str]) -> Result<bool> {
        self.set_ignored_state(keys, NodeState::UserIgnored)
    }

    fn set_ignored_state(&mut self, keys: &[&str], state: NodeState) -> Result<bool> {
        let Some(node) = self.config.get_mut(keys)? else {
            return Ok(false);
        };
        if node.state == state || node.state == NodeState::SystemIgnored {
            return Ok(false);
        }
        let info = format!("{:?} -> {:?}", node.state, state);
        node.state = state;
        let value = node.as_scalar().map(str::to_string);
        self.report(keys, value.as_deref(), info);
        Ok(true)
    }

    fn report(&mut self, keys: &[&str], value: Option<&str>, info: String) {
        let (section, option) = match keys.split_last() {
            Some((last, rest)) if !rest.is_empty() => (rest.join("="), Some(*last)),
            Some((last, _)) => ((*last).to_string(), None),
            None => (String::new(), None),
        };
        self.reports
            .push(Report::new(section, option, value).with_info(info));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigNode {
        let mut config = ConfigNode::new();
        config.set(&["env", "FOO"], Some("1"), None).unwrap();
        config
            .set(&["env", "OLD"], Some("x"), Some(NodeState::UserIgnored))
            .unwrap();
        config
            .set(&["env", "LOCKED"], Some("y"), Some(NodeState::SystemIgnored))
            .unwrap();
        config
    }

    #[test]
    fn add_setting_is_idempotent() {
        let mut config = sample();
        let mut editor = MacroEditor::new(&mut config);
        assert!(editor.add_setting(&["env", "NEW"], Some("v")).unwrap());
        assert!(!editor.add_setting(&["env", "NEW"], Some("other")).unwrap());
        let reports = editor.into_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(config.get_value(&["env", "NEW"]), Some("v"));
    }

    #[test]
    fn change_value_reports_old_and_new() {
        let mut config = sample();
        let mut editor = MacroEditor::new(&mut config);
        assert!(editor.change_setting_value(&["env", "FOO"], "2").unwrap());
        assert!(!editor.change_setting_value(&["env", "FOO"], "2").unwrap());
        let reports = editor.into_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].info, "Value: '1' -> '2'");
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut config = sample();
        let mut editor = MacroEditor::new(&mut config);
        assert!(editor.remove_setting(&["env", "FOO"]).unwrap());
        assert!(!editor.remove_setting(&["env", "FOO"]).unwrap());
        assert_eq!(editor.into_reports().len(), 1);
    }

    #[test]
    fn rename_carries_state_and_comments() {
        let mut config = sample();
        config
            .set_comments(&["env", "OLD"], vec![" keep me".to_string()])
            .unwrap();
        let mut editor = MacroEditor::new(&mut config);
        assert!(editor
            .rename_setting(&["env", "OLD"], &["env", "NEW"])
            .unwrap());
        let node = config.get(&["env", "NEW"]).unwrap().unwrap();
        assert_eq!(node.state, NodeState::UserIgnored);
        assert_eq!(node.comments, vec![" keep me".to_string()]);
        assert!(config.get(&["env", "OLD"]).unwrap().is_none());
    }

    #[test]
    fn enable_promotes_user_ignored_only() {
        let mut config = sample();
        let mut editor = MacroEditor::new(&mut config);
        assert!(editor.enable_setting(&["env", "OLD"]).unwrap());
        assert!(!editor.enable_setting(&["env", "LOCKED"]).unwrap());
        drop(editor);
        assert_eq!(
            config.get(&["env", "OLD"]).unwrap().unwrap().state,
            NodeState::Normal
        );
        assert_eq!(
            config.get(&["env", "LOCKED"]).unwrap().unwrap().state,
            NodeState::SystemIgnored
        );
    }

    #[test]
    fn ignore_never_touches_system_ignored() {
        let mut config = sample();
        let mut editor = MacroEditor::new(&mut config);
        assert!(editor.ignore_setting(&["env", "FOO"]).unwrap());
        assert!(!editor.ignore_setting(&["env", "LOCKED"]).unwrap());
    }
}
