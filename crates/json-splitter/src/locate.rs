//! Mapping structural locations back onto clusters.
//!
//! Diagnostic tooling needs to know which cluster covers a given spot
//! in the original document. The contract is path-prefix matching
//! followed by `child_keys` membership: a cluster with `child_keys`
//! covers only the listed children of its path, one without covers
//! the whole subtree.

use crate::cluster::Cluster;
use crate::graph::Graph;
use json_splitter_node_path::{path_starts_with, NodeId, Segment};
use std::collections::HashMap;

/// Find the index of the cluster covering `path`, if any.
///
/// A partial cluster does not cover its own `path` node, only the
/// children named in `child_keys`.
///
/// # Example
///
/// ```
/// use json_splitter::locate::locate_cluster;
/// use json_splitter::{split, SplitOptions, Segment};
/// use serde_json::json;
///
/// let document = json!({"a": {"b": 1}, "c": 2});
/// let clusters = split(&document, &SplitOptions::new(1000)).unwrap();
///
/// let covering = locate_cluster(&clusters, &[Segment::key("a"), Segment::key("b")]);
/// assert!(covering.is_some());
/// ```
pub fn locate_cluster(clusters: &[Cluster], path: &[Segment]) -> Option<usize> {
    for (index, cluster) in clusters.iter().enumerate() {
        if !path_starts_with(path, &cluster.path) {
            continue;
        }
        match &cluster.child_keys {
            None => return Some(index),
            Some(keys) => {
                if let Some(next) = path.get(cluster.path.len()) {
                    if keys.contains(next) {
                        return Some(index);
                    }
                }
            }
        }
    }
    None
}

/// Map every covered node of a graph to the index of its cluster.
///
/// Nodes outside any cluster (e.g. an unpromoted shared ancestor of
/// several clusters) are absent from the result.
pub fn cluster_index_by_node(graph: &Graph, clusters: &[Cluster]) -> HashMap<NodeId, usize> {
    graph
        .nodes()
        .filter_map(|(id, node)| locate_cluster(clusters, &node.path).map(|index| (id.clone(), index)))
        .collect()
}
