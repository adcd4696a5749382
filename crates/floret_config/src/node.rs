//! The configuration node tree.

use crate::error::ConfigError;
use crate::Result;
use indexmap::IndexMap;

/// Tri-state enable flag for a node.
///
/// `SystemIgnored` marks settings disabled by machinery (e.g. trigger
/// evaluation) and is never cleared by user-facing operations;
/// `UserIgnored` can be toggled freely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NodeState {
    #[default]
    Normal,
    UserIgnored,
    SystemIgnored,
}

impl NodeState {
    /// Text prefix used by the flat-file format.
    pub fn prefix(self) -> &'static str {
        match self {
            NodeState::Normal => "",
            NodeState::UserIgnored => "!",
            NodeState::SystemIgnored => "!!",
        }
    }

    pub fn is_ignored(self) -> bool {
        self != NodeState::Normal
    }
}

/// Node payload: a scalar setting or an ordered mapping of children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Scalar(String),
    Map(IndexMap<String, ConfigNode>),
}

impl Default for NodeValue {
    fn default() -> Self {
        NodeValue::Map(IndexMap::new())
    }
}

/// A node in a configuration tree.
///
/// The root of a configuration is itself a `ConfigNode` whose value is a
/// mapping of sections. Paths are ordered key sequences; the empty path
/// addresses the root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigNode {
    pub value: NodeValue,
    pub state: NodeState,
    pub comments: Vec<String>,
}

impl ConfigNode {
    /// An empty mapping node in the normal state.
    pub fn new() -> Self {
        Self::default()
    }

    /// A scalar setting node in the normal state.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self {
            value: NodeValue::Scalar(value.into()),
            state: NodeState::Normal,
            comments: Vec::new(),
        }
    }

    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = state;
        self
    }

    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    pub fn is_ignored(&self) -> bool {
        self.state.is_ignored()
    }

    /// The scalar value, if this node is a setting.
    pub fn as_scalar(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar(s) => Some(s),
            NodeValue::Map(_) => None,
        }
    }

    /// The child mapping, if this node is a section.
    pub fn as_map(&self) -> Option<&IndexMap<String, ConfigNode>> {
        match &self.value {
            NodeValue::Map(map) => Some(map),
            NodeValue::Scalar(_) => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<String, ConfigNode>> {
        match &mut self.value {
            NodeValue::Map(map) => Some(map),
            NodeValue::Scalar(_) => None,
        }
    }

    /// Iterate over direct children in insertion order, including ignored
    /// ones.
    pub fn children(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        match &self.value {
            NodeValue::Map(map) => {
                Box::new(map.iter().map(|(k, v)| (k.as_str(), v)))
                    as Box<dyn Iterator<Item = (&str, &ConfigNode)>>
            }
            NodeValue::Scalar(_) => Box::new(std::iter::empty()),
        }
    }

    /// Return the node at `keys`, if any.
    ///
    /// The lookup never filters by ignore state: an ignored node is
    /// returned like any other and the caller decides what its state
    /// means. A missing segment yields `Ok(None)`. Traversing through a
    /// scalar setting is a structure conflict, never a silent miss.
    pub fn get(&self, keys: &[&str]) -> Result<Option<&ConfigNode>> {
        let mut node = self;
        for (depth, key) in keys.iter().enumerate() {
            let map = match &node.value {
                NodeValue::Map(map) => map,
                NodeValue::Scalar(_) => return Err(ConfigError::conflict(&keys[..depth])),
            };
            node = match map.get(*key) {
                Some(child) => child,
                None => return Ok(None),
            };
        }
        Ok(Some(node))
    }

    /// Mutable variant of [`ConfigNode::get`].
    pub fn get_mut(&mut self, keys: &[&str]) -> Result<Option<&mut ConfigNode>> {
        let mut node = self;
        for (depth, key) in keys.iter().enumerate() {
            let map = match &mut node.value {
                NodeValue::Map(map) => map,
                NodeValue::Scalar(_) => return Err(ConfigError::conflict(&keys[..depth])),
            };
            node = match map.get_mut(*key) {
                Some(child) => child,
                None => return Ok(None),
            };
        }
        Ok(Some(node))
    }

    /// Return the scalar value at `keys` for an enabled setting.
    ///
    /// Yields `None` if the setting is absent, if it or any ancestor on
    /// the path is ignored, or if the path does not address a scalar.
    pub fn get_value(&self, keys: &[&str]) -> Option<&str> {
        let mut node = self;
        for key in keys {
            if node.is_ignored() {
                return None;
            }
            node = node.as_map()?.get(*key)?;
        }
        if node.is_ignored() {
            return None;
        }
        node.as_scalar()
    }

    /// Set node properties at `keys`, creating intermediate sections as
    /// needed.
    ///
    /// `value` of `Some` makes the leaf a scalar setting; `None` ensures
    /// it is a section, preserving any existing children. `state` of
    /// `None` leaves the state unchanged (new nodes start normal).
    /// Existing comments are preserved. An intermediate scalar node is a
    /// structure conflict; nothing is overwritten.
    pub fn set(
        &mut self,
        keys: &[&str],
        value: Option<&str>,
        state: Option<NodeState>,
    ) -> Result<&mut ConfigNode> {
        let mut node = self;
        for (depth, key) in keys.iter().enumerate() {
            let map = match &mut node.value {
                NodeValue::Map(map) => map,
                NodeValue::Scalar(_) => return Err(ConfigError::conflict(&keys[..depth])),
            };
            node = map.entry((*key).to_string()).or_default();
        }
        match value {
            Some(scalar) => node.value = NodeValue::Scalar(scalar.to_string()),
            None => {
                if matches!(node.value, NodeValue::Scalar(_)) {
                    node.value = NodeValue::Map(IndexMap::new());
                }
            }
        }
        if let Some(state) = state {
            node.state = state;
        }
        Ok(node)
    }

    /// Set only the state of an existing node. Returns the previous state,
    /// or `None` if the node is absent.
    pub fn set_state(&mut self, keys: &[&str], state: NodeState) -> Result<Option<NodeState>> {
        match self.get_mut(keys)? {
            Some(node) => {
                let prev = node.state;
                node.state = state;
                Ok(Some(prev))
            }
            None => Ok(None),
        }
    }

    /// Replace the comments of an existing node.
    pub fn set_comments(&mut self, keys: &[&str], comments: Vec<String>) -> Result<bool> {
        match self.get_mut(keys)? {
            Some(node) => {
                node.comments = comments;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the node at `keys`, returning it if it existed.
    ///
    /// Removing an absent node is a no-op; sibling order is preserved.
    pub fn unset(&mut self, keys: &[&str]) -> Option<ConfigNode> {
        let (last, parents) = keys.split_last()?;
        let parent = self.get_mut(parents).ok().flatten()?;
        parent.as_map_mut()?.shift_remove(*last)
    }

    /// Depth-first iteration over all sub-nodes, skipping ignored
    /// subtrees.
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(self, false)
    }

    /// Depth-first iteration over all sub-nodes, ignored ones included.
    pub fn walk_all(&self) -> Walk<'_> {
        Walk::new(self, true)
    }
}

/// Iterator over `(path, node)` pairs below a root, in insertion order.
pub struct Walk<'a> {
    stack: Vec<(Vec<String>, &'a ConfigNode)>,
    include_ignored: bool,
}

impl<'a> Walk<'a> {
    fn new(root: &'a ConfigNode, include_ignored: bool) -> Self {
        let mut stack = Vec::new();
        if let NodeValue::Map(map) = &root.value {
            for (key, child) in map.iter().rev() {
                stack.push((vec![key.clone()], child));
            }
        }
        Walk {
            stack,
            include_ignored,
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (Vec<String>, &'a ConfigNode);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (keys, node) = self.stack.pop()?;
            if node.is_ignored() && !self.include_ignored {
                continue;
            }
            if let NodeValue::Map(map) = &node.value {
                for (key, child) in map.iter().rev() {
                    let mut child_keys = keys.clone();
                    child_keys.push(key.clone());
                    self.stack.push((child_keys, child));
                }
            }
            return Some((keys, node));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigNode {
        let mut root = ConfigNode::new();
        root.set(&["env", "FOO"], Some("foo"), None).unwrap();
        root.set(&["env", "BAR"], Some("bar"), None).unwrap();
        root.set(&["command", "default"], Some("true"), None)
            .unwrap();
        root
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut root = ConfigNode::new();
        root.set(&["a", "b", "c"], Some("1"), None).unwrap();
        let node = root.get(&["a", "b", "c"]).unwrap().unwrap();
        assert_eq!(node.as_scalar(), Some("1"));
        assert_eq!(node.state, NodeState::Normal);
    }

    #[test]
    fn get_missing_is_absent_not_error() {
        let root = sample();
        assert_eq!(root.get(&["env", "BAZ"]).unwrap(), None);
        assert_eq!(root.get(&["nope", "FOO"]).unwrap(), None);
    }

    #[test]
    fn get_through_scalar_is_conflict() {
        let root = sample();
        let err = root.get(&["env", "FOO", "deeper"]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::StructureConflict {
                path: "env=FOO".to_string()
            }
        );
    }

    #[test]
    fn set_through_scalar_is_conflict() {
        let mut root = sample();
        let err = root
            .set(&["env", "FOO", "deeper"], Some("x"), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::StructureConflict { .. }));
        // The original setting is untouched.
        assert_eq!(root.get_value(&["env", "FOO"]), Some("foo"));
    }

    #[test]
    fn set_preserves_comments_and_state() {
        let mut root = sample();
        root.set_comments(&["env", "FOO"], vec![" a note".to_string()])
            .unwrap();
        root.set(&["env", "FOO"], Some("foo2"), None).unwrap();
        let node = root.get(&["env", "FOO"]).unwrap().unwrap();
        assert_eq!(node.comments, vec![" a note".to_string()]);
        assert_eq!(node.as_scalar(), Some("foo2"));
    }

    #[test]
    fn set_section_keeps_children() {
        let mut root = sample();
        root.set(&["env"], None, Some(NodeState::UserIgnored))
            .unwrap();
        let env = root.get(&["env"]).unwrap().unwrap();
        assert_eq!(env.state, NodeState::UserIgnored);
        assert_eq!(env.as_map().unwrap().len(), 2);
    }

    #[test]
    fn double_unset_is_noop() {
        let mut root = sample();
        assert!(root.unset(&["env", "FOO"]).is_some());
        assert!(root.unset(&["env", "FOO"]).is_none());
        assert!(root.unset(&["env", "FOO"]).is_none());
    }

    #[test]
    fn ignored_nodes_stay_addressable_via_get() {
        let mut root = sample();
        root.set_state(&["env"], NodeState::UserIgnored).unwrap();
        let env = root.get(&["env"]).unwrap().unwrap();
        assert!(env.is_ignored());
        // Direct get still descends into the ignored section.
        assert!(root.get(&["env", "FOO"]).unwrap().is_some());
        // The value accessor treats it as absent.
        assert_eq!(root.get_value(&["env", "FOO"]), None);
    }

    #[test]
    fn walk_skips_ignored_subtrees() {
        let mut root = sample();
        root.set_state(&["env"], NodeState::SystemIgnored).unwrap();
        let seen: Vec<String> = root.walk().map(|(keys, _)| keys.join("=")).collect();
        assert_eq!(seen, vec!["command", "command=default"]);
        let seen_all: Vec<String> = root.walk_all().map(|(keys, _)| keys.join("=")).collect();
        assert!(seen_all.contains(&"env=FOO".to_string()));
    }

    #[test]
    fn walk_is_insertion_ordered() {
        let root = sample();
        let seen: Vec<String> = root.walk().map(|(keys, _)| keys.join("=")).collect();
        assert_eq!(
            seen,
            vec!["env", "env=FOO", "env=BAR", "command", "command=default"]
        );
    }

    #[test]
    fn equality_ignores_key_order() {
        let mut a = ConfigNode::new();
        a.set(&["s", "x"], Some("1"), None).unwrap();
        a.set(&["s", "y"], Some("2"), None).unwrap();
        let mut b = ConfigNode::new();
        b.set(&["s", "y"], Some("2"), None).unwrap();
        b.set(&["s", "x"], Some("1"), None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn equality_respects_state() {
        let mut a = sample();
        let b = sample();
        a.set_state(&["env", "FOO"], NodeState::UserIgnored)
            .unwrap();
        assert_ne!(a, b);
    }
}
