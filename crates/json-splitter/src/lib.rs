//! Weight-bounded partitioning of JSON documents.
//!
//! Splits an arbitrary nested JSON value into disjoint sub-documents
//! ("clusters"), each within a caller-supplied weight budget (for
//! example serialized byte length or a tokenizer's token count),
//! minimizing the number of clusters and balancing their weights.
//! Logically related sub-structures stay together whenever they fit,
//! and array elements only group into contiguous index ranges.
//!
//! The document becomes a rooted structural graph; a greedy clusterer
//! merges adjacent clusters under the budget; a multi-start sampler
//! repeats the greedy run under seeded random traversal orders and
//! keeps the partition with the fewest, most evenly weighted clusters.
//!
//! # Example
//!
//! ```
//! use json_splitter::{split, SplitOptions};
//! use serde_json::json;
//!
//! let document = json!({
//!     "title": "example",
//!     "sections": [
//!         {"heading": "one", "body": "first section"},
//!         {"heading": "two", "body": "second section"}
//!     ]
//! });
//!
//! // Budget is serialized length in bytes by default.
//! let clusters = split(&document, &SplitOptions::new(60)).unwrap();
//!
//! // Together the clusters cover every value of the document exactly
//! // once, and none of them exceeds the budget unless a single leaf
//! // already does.
//! assert!(!clusters.is_empty());
//! for cluster in &clusters {
//!     assert!(cluster.weight <= 60);
//! }
//! ```

pub mod cluster;
pub mod graph;
pub mod locate;
pub mod sample;
pub mod split;
pub mod weight;

pub use cluster::{create_clusters, reconstruct, ChildKeys, Cluster, ClusterCandidate, SplitError};
pub use graph::{build_graph, Graph, Node, NodeKind};
pub use locate::{cluster_index_by_node, locate_cluster};
pub use sample::sample_clusters;
pub use split::{split, split_with, SplitOptions};
pub use weight::{serialized_size, serialized_weight, WeightError, WeightFn};

// Path primitives live in their own crate; re-exported for callers.
pub use json_splitter_node_path::{format_node_id, path_starts_with, NodeId, NodePath, Segment};
