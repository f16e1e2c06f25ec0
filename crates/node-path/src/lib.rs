//! Structural path and node identifier codec.
//!
//! A document location is an ordered sequence of [`Segment`]s (object
//! keys and array indices) starting at the root. Each path maps to a
//! deterministic string identifier used as a map key and as a stable
//! tie-breaker: the root is `$`, index segments append `[i]`, and key
//! segments append `.key`.
//!
//! # Example
//!
//! ```
//! use json_splitter_node_path::{format_node_id, path_starts_with, Segment};
//!
//! let path = vec![Segment::key("items"), Segment::Index(2), Segment::key("name")];
//! assert_eq!(format_node_id(&path), "$.items[2].name");
//!
//! let prefix = vec![Segment::key("items"), Segment::Index(2)];
//! assert!(path_starts_with(&path, &prefix));
//! assert!(!path_starts_with(&prefix, &path));
//! ```

mod types;
pub use types::{NodeId, NodePath, Segment};

/// Format a structural path into its node identifier.
///
/// Distinct paths within one document never produce the same
/// identifier, so the result is safe to use as a map key.
///
/// # Example
///
/// ```
/// use json_splitter_node_path::{format_node_id, Segment};
///
/// assert_eq!(format_node_id(&[]), "$");
/// assert_eq!(format_node_id(&[Segment::Index(0)]), "$[0]");
/// assert_eq!(format_node_id(&[Segment::key("a"), Segment::key("b")]), "$.a.b");
/// ```
pub fn format_node_id(path: &[Segment]) -> NodeId {
    let mut id = String::from("$");
    for segment in path {
        match segment {
            Segment::Key(key) => {
                id.push('.');
                id.push_str(key);
            }
            Segment::Index(index) => {
                id.push('[');
                id.push_str(&index.to_string());
                id.push(']');
            }
        }
    }
    id
}

/// Test whether `path` begins with every segment of `prefix`.
///
/// The empty prefix (the document root) matches every path.
///
/// # Example
///
/// ```
/// use json_splitter_node_path::{path_starts_with, Segment};
///
/// let path = vec![Segment::key("a"), Segment::Index(1)];
/// assert!(path_starts_with(&path, &[]));
/// assert!(path_starts_with(&path, &[Segment::key("a")]));
/// assert!(!path_starts_with(&path, &[Segment::key("b")]));
/// ```
pub fn path_starts_with(path: &[Segment], prefix: &[Segment]) -> bool {
    path.len() >= prefix.len() && path[..prefix.len()] == *prefix
}
