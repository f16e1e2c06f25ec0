//! Type definitions for structural paths.

use std::fmt;

/// A single step in a structural path.
///
/// Can be either a string (object key) or a non-negative integer
/// (array index).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
}

impl Segment {
    /// Build a key segment from anything string-like.
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }

    /// Get the array index if this is an index segment.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Key(_) => None,
        }
    }

    /// Get the object key if this is a key segment.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{k}"),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// A structural path from the document root.
///
/// The empty path denotes the root itself.
pub type NodePath = Vec<Segment>;

/// A stable string identifier derived from a [`NodePath`].
///
/// See [`format_node_id`](crate::format_node_id) for the encoding.
pub type NodeId = String;
