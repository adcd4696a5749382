//! Hierarchical configuration data model for Floret.
//!
//! A configuration is a tree of [`ConfigNode`]s: each node is either a
//! scalar setting or an ordered mapping of named child nodes. Every node
//! carries a tri-state ignore flag and any comment lines that preceded it
//! in the source file.
//!
//! Ignore semantics are applied in exactly one place. Direct lookups with
//! [`ConfigNode::get`] never filter by state: an ignored node is still
//! addressable and callers inspect `state` themselves. Bulk iteration with
//! [`ConfigNode::walk`] skips ignored subtrees; [`ConfigNode::walk_all`]
//! does not. The convenience accessor [`ConfigNode::get_value`] treats
//! ignored settings (and settings under ignored sections) as absent.

mod error;
mod loader;
mod node;

pub use error::ConfigError;
pub use loader::{dump, load_str};
pub use node::{ConfigNode, NodeState, NodeValue, Walk};

/// Operation result type for the configuration layer.
pub type Result<T> = std::result::Result<T, ConfigError>;
