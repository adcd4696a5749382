//! The location model.

use std::fmt;
use std::path::PathBuf;

/// Shape of a location's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocType {
    /// A single file.
    Blob,
    /// A directory tree.
    Tree,
}

/// A named source of content, progressively filled in by handlers.
///
/// `scheme` and `loc_type` are set only by a successful `parse`;
/// `cache` only by a successful `pull`. `paths` holds relative paths
/// paired with content digests: for a blob a single `("", digest)`
/// entry, for a tree one entry per file plus digest-less entries for
/// directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub scheme: Option<String>,
    pub loc_type: Option<LocType>,
    pub paths: Vec<(String, Option<String>)>,
    pub cache: Option<PathBuf>,
}

impl Location {
    /// Build from an identifier. `svn:https://host/x` has scheme "svn"
    /// and name `https://host/x`; a bare path defaults to "fs".
    pub fn parse_id(id: &str) -> Self {
        let (scheme, name) = match id.split_once(':') {
            // A ':' after a '/' is part of a path, not a scheme separator.
            Some((scheme, rest)) if !scheme.is_empty() && !scheme.contains('/') => {
                (Some(scheme.to_string()), rest.to_string())
            }
            _ => (Some("fs".to_string()), id.to_string()),
        };
        Location {
            name,
            scheme,
            loc_type: None,
            paths: Vec::new(),
            cache: None,
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Location {
            name: name.into(),
            scheme: None,
            loc_type: None,
            paths: Vec::new(),
            cache: None,
        }
    }

    /// Whether a handler has parsed this location.
    pub fn is_parsed(&self) -> bool {
        self.loc_type.is_some()
    }

    /// Whether the parsed digests match another location's exactly.
    pub fn same_content(&self, other: &Location) -> bool {
        self.is_parsed()
            && other.is_parsed()
            && self.loc_type == other.loc_type
            && self.paths == other.paths
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scheme {
            Some(scheme) => write!(f, "{scheme}:{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
