//! Loader and dumper for the flat configuration text format.
//!
//! The format is line-oriented: `[section]` headers open a section,
//! `key=value` lines assign options, `!` or `!!` prefixes (on the option
//! key or inside the section brackets) carry the ignore state, `#` lines
//! are comments attached to the following setting, and indented lines
//! starting with `=` continue the previous option value. A bare `[]`
//! header returns to root level.
//!
//! Comment lines at the very top of a file, before the first blank line,
//! belong to the root node. Dumping a loaded tree reproduces the input
//! byte for byte for canonical sources. Trees nested deeper than
//! section/option (only possible programmatically) are dumped with the
//! parent path joined into the section header with "=".

use crate::error::ConfigError;
use crate::node::{ConfigNode, NodeState, NodeValue};
use crate::Result;

const CHAR_ASSIGN: char = '=';
const CHAR_COMMENT: char = '#';

/// Parse configuration text into a tree, merging into `node`.
pub fn load_str(text: &str, node: &mut ConfigNode) -> Result<()> {
    let mut section: Vec<String> = Vec::new();
    // Keys of the option last assigned, for continuation lines.
    let mut last_option: Option<Vec<String>> = None;
    // None until the first blank line: leading comments belong to root.
    let mut comments: Option<Vec<String>> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        if line.trim().is_empty() {
            comments = Some(Vec::new());
            continue;
        }
        if line.trim_start().starts_with(CHAR_COMMENT) {
            let comment = strip_comment(line);
            match &mut comments {
                None => node.comments.push(comment),
                Some(pending) => pending.push(comment),
            }
            continue;
        }
        // Option value continuation.
        if line.starts_with(char::is_whitespace) {
            let Some(keys) = &last_option else {
                return Err(ConfigError::Syntax {
                    line_num,
                    line: line.to_string(),
                });
            };
            let keys_ref: Vec<&str> = keys.iter().map(String::as_str).collect();
            if let Some(target) = node.get_mut(&keys_ref)? {
                let mut cont = line.trim();
                if let Some(rest) = cont.strip_prefix(CHAR_ASSIGN) {
                    cont = rest;
                }
                if let NodeValue::Scalar(value) = &mut target.value {
                    value.push('\n');
                    value.push_str(cont);
                }
            }
            continue;
        }
        if let Some((state, name)) = parse_section_header(line) {
            section.clear();
            last_option = None;
            if !name.is_empty() {
                section.push(name.to_string());
                let keys: Vec<&str> = section.iter().map(String::as_str).collect();
                let sect = node.set(&keys, None, Some(state))?;
                if let Some(pending) = comments.take() {
                    sect.comments = pending;
                }
            }
            comments = Some(Vec::new());
            continue;
        }
        if let Some((state, key, value)) = parse_option(line) {
            let mut keys = section.clone();
            keys.push(key.to_string());
            let keys_ref: Vec<&str> = keys.iter().map(String::as_str).collect();
            let opt = node.set(&keys_ref, Some(value), Some(state))?;
            if let Some(pending) = comments.take() {
                opt.comments = pending;
            }
            comments = Some(Vec::new());
            last_option = Some(keys);
            continue;
        }
        return Err(ConfigError::Syntax {
            line_num,
            line: line.to_string(),
        });
    }
    Ok(())
}

/// Serialize a tree to configuration text.
pub fn dump(root: &ConfigNode) -> String {
    let mut out = String::new();
    let mut wrote_block = false;
    for comment in &root.comments {
        out.push(CHAR_COMMENT);
        out.push_str(comment);
        out.push('\n');
        wrote_block = true;
    }
    // Root-level options come before any section.
    let mut wrote_root_option = false;
    for (key, child) in root.children() {
        if let NodeValue::Scalar(_) = child.value {
            if wrote_block && !wrote_root_option {
                out.push('\n');
            }
            dump_option(&mut out, key, child);
            wrote_root_option = true;
        }
    }
    wrote_block |= wrote_root_option;
    for (key, child) in root.children() {
        if let NodeValue::Map(_) = child.value {
            if wrote_block {
                out.push('\n');
            }
            dump_section(&mut out, key, child);
            wrote_block = true;
        }
    }
    out
}

fn dump_section(out: &mut String, name: &str, node: &ConfigNode) {
    for comment in &node.comments {
        out.push(CHAR_COMMENT);
        out.push_str(comment);
        out.push('\n');
    }
    out.push('[');
    out.push_str(node.state.prefix());
    out.push_str(name);
    out.push_str("]\n");
    for (key, child) in node.children() {
        if let NodeValue::Scalar(_) = child.value {
            dump_option(out, key, child);
        }
    }
    for (key, child) in node.children() {
        if let NodeValue::Map(_) = child.value {
            out.push('\n');
            dump_section(out, &format!("{name}={key}"), child);
        }
    }
}

fn dump_option(out: &mut String, key: &str, node: &ConfigNode) {
    for comment in &node.comments {
        out.push(CHAR_COMMENT);
        out.push_str(comment);
        out.push('\n');
    }
    let value = match &node.value {
        NodeValue::Scalar(value) => value.as_str(),
        NodeValue::Map(_) => return,
    };
    let head = format!("{}{}", node.state.prefix(), key);
    let mut lines = value.split('\n');
    out.push_str(&head);
    out.push(CHAR_ASSIGN);
    out.push_str(lines.next().unwrap_or(""));
    out.push('\n');
    for cont in lines {
        for _ in 0..head.len() {
            out.push(' ');
        }
        out.push(CHAR_ASSIGN);
        out.push_str(cont);
        out.push('\n');
    }
}

fn strip_comment(line: &str) -> String {
    line.trim_start()
        .strip_prefix(CHAR_COMMENT)
        .unwrap_or("")
        .to_string()
}

fn parse_section_header(line: &str) -> Option<(NodeState, &str)> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    let (state, name) = split_state(inner);
    Some((state, name.trim()))
}

fn parse_option(line: &str) -> Option<(NodeState, &str, &str)> {
    let (state, rest) = split_state(line);
    let (key, value) = rest.split_once(CHAR_ASSIGN)?;
    let key = key.trim_end();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((state, key, value.trim_start()))
}

fn split_state(text: &str) -> (NodeState, &str) {
    if let Some(rest) = text.strip_prefix("!!") {
        (NodeState::SystemIgnored, rest)
    } else if let Some(rest) = text.strip_prefix('!') {
        (NodeState::UserIgnored, rest)
    } else {
        (NodeState::Normal, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "\
#suite configuration

mode=live

[command]
default=run-forecast

[env]
#resolution in km
GRID=12
!DEBUG=true

[!!template:suite.rc]
HOURS=6
";

    fn load(text: &str) -> ConfigNode {
        let mut node = ConfigNode::new();
        load_str(text, &mut node).unwrap();
        node
    }

    #[test]
    fn load_basic_shape() {
        let node = load(CANONICAL);
        assert_eq!(node.get_value(&["mode"]), Some("live"));
        assert_eq!(node.get_value(&["command", "default"]), Some("run-forecast"));
        assert_eq!(node.get_value(&["env", "GRID"]), Some("12"));
        let debug = node.get(&["env", "DEBUG"]).unwrap().unwrap();
        assert_eq!(debug.state, NodeState::UserIgnored);
        assert_eq!(debug.as_scalar(), Some("true"));
        let tmpl = node.get(&["template:suite.rc"]).unwrap().unwrap();
        assert_eq!(tmpl.state, NodeState::SystemIgnored);
    }

    #[test]
    fn comments_attach_to_following_setting() {
        let node = load(CANONICAL);
        assert_eq!(node.comments, vec!["suite configuration".to_string()]);
        let grid = node.get(&["env", "GRID"]).unwrap().unwrap();
        assert_eq!(grid.comments, vec!["resolution in km".to_string()]);
    }

    #[test]
    fn round_trip_is_byte_identical() {
        let node = load(CANONICAL);
        assert_eq!(dump(&node), CANONICAL);
    }

    #[test]
    fn no_op_pass_round_trips() {
        // load -> no-op macro pass -> dump must reproduce the input.
        let mut node = load(CANONICAL);
        for _ in node.walk() {}
        node.set(&["env", "GRID"], Some("12"), None).unwrap();
        assert_eq!(dump(&node), CANONICAL);
    }

    #[test]
    fn continuation_lines_build_multiline_values() {
        let text = "[command]\ndefault=step one\n       =step two\n";
        let node = load(text);
        assert_eq!(
            node.get_value(&["command", "default"]),
            Some("step one\nstep two")
        );
        assert_eq!(dump(&node), text);
    }

    #[test]
    fn empty_header_returns_to_root() {
        let text = "[env]\nFOO=1\n\n[]\ntop=yes\n";
        let node = load(text);
        assert_eq!(node.get_value(&["top"]), Some("yes"));
    }

    #[test]
    fn bad_line_is_syntax_error() {
        let mut node = ConfigNode::new();
        let err = load_str("not an assignment\n", &mut node).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Syntax {
                line_num: 1,
                line: "not an assignment".to_string()
            }
        );
    }

    #[test]
    fn duplicate_section_merges() {
        let text = "[env]\nA=1\n\n[env]\nB=2\n";
        let node = load(text);
        assert_eq!(node.get_value(&["env", "A"]), Some("1"));
        assert_eq!(node.get_value(&["env", "B"]), Some("2"));
    }
}
