//! Weight-bounded greedy clustering.
//!
//! Leaves seed singleton clusters, then a fixed-point loop merges
//! adjacent clusters while the reconstructed candidate stays within
//! the weight budget. Array children only merge across adjacent
//! indices, preserving element order; once every child of a parent
//! sits in one cluster, the parent itself is absorbed ("promotion"),
//! letting the cluster climb the tree and merge with the parent's own
//! siblings in later passes.

use crate::graph::{Graph, Node, NodeKind};
use crate::weight::{WeightError, WeightFn};
use json_splitter_node_path::{format_node_id, NodeId, NodePath, Segment};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};
use thiserror::Error;

/// The child segments a partial cluster covers, in segment order.
pub type ChildKeys = BTreeSet<Segment>;

#[derive(Debug, Error)]
pub enum SplitError {
    /// A clustering attempt exceeded its wall-clock budget. Never
    /// carries a partial result.
    #[error("clustering attempt exceeded its timeout")]
    Timeout,
    /// A node identifier had no entry in the graph. Internal
    /// consistency violation.
    #[error("graph lookup failed for node: {0}")]
    UnknownNode(NodeId),
    /// Reconstruction was asked for an empty identifier set. Internal
    /// consistency violation.
    #[error("reconstruction requires at least one node")]
    EmptyNodeSet,
    /// A merge set's common parent was a scalar. Internal consistency
    /// violation; unreachable for graphs built by `build_graph`.
    #[error("malformed graph: parent of merge set is a scalar: {0}")]
    ScalarParent(NodeId),
    /// A child's trailing path segment did not match its parent's
    /// kind. Internal consistency violation.
    #[error("malformed graph: child path tail does not match parent kind: {0}")]
    ChildKindMismatch(NodeId),
    /// The caller-supplied weight function failed.
    #[error("weight function failed: {0}")]
    Weight(#[source] WeightError),
}

/// A tentative reconstruction of a merge, used to evaluate cost
/// before committing.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterCandidate {
    /// Absolute path of the merge point.
    pub path: NodePath,
    /// The reconstructed sub-document.
    pub value: Value,
    /// Present only when the candidate covers a strict subset of the
    /// parent's children; `None` means the full subtree at `path`.
    pub child_keys: Option<ChildKeys>,
}

/// A committed cluster: a candidate plus its evaluated weight.
///
/// The `path`/`child_keys` pair unambiguously locates the covered
/// region within the original document (see [`crate::locate`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Absolute path of the covered region.
    pub path: NodePath,
    /// The reconstructed sub-document.
    pub value: Value,
    /// Evaluated cost of `value`.
    pub weight: u64,
    /// Covered child segments when the cluster is a strict subset of
    /// a parent's children.
    pub child_keys: Option<ChildKeys>,
}

impl Cluster {
    fn from_candidate(candidate: ClusterCandidate, weight: u64) -> Self {
        Cluster {
            path: candidate.path,
            value: candidate.value,
            weight,
            child_keys: candidate.child_keys,
        }
    }
}

fn lookup<'g>(graph: &'g Graph, id: &str) -> Result<&'g Node, SplitError> {
    graph
        .node(id)
        .ok_or_else(|| SplitError::UnknownNode(id.to_string()))
}

/// Compute the minimal covering value for a set of node identifiers.
///
/// The set is first reduced to the identifiers at the minimum path
/// depth present: when a previously merged parent travels together
/// with its still-listed children, the parent alone already
/// represents the whole subtree. A single surviving identifier yields
/// its own subtree; several must share one parent, whose kind decides
/// whether the value is rebuilt as an index-sorted array slice or an
/// ordered key→value map.
///
/// # Example
///
/// ```
/// use json_splitter::cluster::reconstruct;
/// use json_splitter::graph::build_graph;
/// use json_splitter::Segment;
/// use serde_json::json;
///
/// let graph = build_graph(&json!(["one", "two", "three"]));
/// let candidate = reconstruct(&["$[1]".into(), "$[2]".into()], &graph).unwrap();
/// assert_eq!(candidate.path, vec![]);
/// assert_eq!(candidate.value, json!(["two", "three"]));
/// let keys = candidate.child_keys.unwrap();
/// assert!(keys.contains(&Segment::Index(1)) && keys.contains(&Segment::Index(2)));
/// ```
pub fn reconstruct(node_ids: &[NodeId], graph: &Graph) -> Result<ClusterCandidate, SplitError> {
    let mut nodes = Vec::with_capacity(node_ids.len());
    for id in node_ids {
        nodes.push((id, lookup(graph, id)?));
    }

    // Reduce to the minimal covering subset: only the shallowest
    // entries are needed, deeper ones are already contained in them.
    let min_depth = nodes
        .iter()
        .map(|(_, node)| node.path.len())
        .min()
        .ok_or(SplitError::EmptyNodeSet)?;
    let reduced: Vec<(&NodeId, &Node)> = nodes
        .into_iter()
        .filter(|(_, node)| node.path.len() == min_depth)
        .collect();

    if let [(_, node)] = reduced.as_slice() {
        return Ok(ClusterCandidate {
            path: node.path.clone(),
            value: node.value.clone(),
            child_keys: None,
        });
    }

    let (first_id, _) = reduced[0];
    let parent_id = graph
        .parent(first_id)
        .ok_or_else(|| SplitError::UnknownNode(first_id.clone()))?;
    let parent = lookup(graph, parent_id)?;

    match parent.kind {
        NodeKind::Array => {
            let mut indexed = Vec::with_capacity(reduced.len());
            for (_, node) in &reduced {
                let index = node
                    .path
                    .last()
                    .and_then(Segment::as_index)
                    .ok_or_else(|| SplitError::ChildKindMismatch(format_node_id(&node.path)))?;
                indexed.push((index, *node));
            }
            indexed.sort_by_key(|(index, _)| *index);

            let value = Value::Array(indexed.iter().map(|(_, node)| node.value.clone()).collect());
            let child_keys = indexed
                .iter()
                .map(|(index, _)| Segment::Index(*index))
                .collect();
            Ok(ClusterCandidate {
                path: parent.path.clone(),
                value,
                child_keys: Some(child_keys),
            })
        }
        NodeKind::Object => {
            let mut map = serde_json::Map::new();
            let mut child_keys = ChildKeys::new();
            for (_, node) in &reduced {
                let key = node
                    .path
                    .last()
                    .and_then(Segment::as_key)
                    .ok_or_else(|| SplitError::ChildKindMismatch(format_node_id(&node.path)))?;
                map.insert(key.to_string(), node.value.clone());
                child_keys.insert(Segment::key(key));
            }
            Ok(ClusterCandidate {
                path: parent.path.clone(),
                value: Value::Object(map),
                child_keys: Some(child_keys),
            })
        }
        NodeKind::Scalar => Err(SplitError::ScalarParent(parent_id.clone())),
    }
}

/// Per-attempt memoization of candidate weights, keyed by the
/// structural signature of a candidate. The same shape is re-evaluated
/// across many merge attempts and the weight function may be
/// expensive.
type WeightCache = HashMap<(NodePath, Option<ChildKeys>), u64>;

/// Per-attempt memoization of reconstructions, keyed by the sorted
/// identifier set.
type ReconstructCache = HashMap<Vec<NodeId>, ClusterCandidate>;

fn weight_cached(
    cache: &mut WeightCache,
    weight: &WeightFn,
    candidate: &ClusterCandidate,
) -> Result<u64, SplitError> {
    let key = (candidate.path.clone(), candidate.child_keys.clone());
    if let Some(cached) = cache.get(&key) {
        return Ok(*cached);
    }
    let evaluated = weight(candidate).map_err(SplitError::Weight)?;
    cache.insert(key, evaluated);
    Ok(evaluated)
}

fn reconstruct_cached(
    cache: &mut ReconstructCache,
    graph: &Graph,
    node_ids: &[NodeId],
) -> Result<ClusterCandidate, SplitError> {
    let mut key = node_ids.to_vec();
    key.sort_unstable();
    if let Some(cached) = cache.get(&key) {
        return Ok(cached.clone());
    }
    let candidate = reconstruct(node_ids, graph)?;
    cache.insert(key, candidate.clone());
    Ok(candidate)
}

/// Run one weight-bounded greedy clustering attempt.
///
/// Every leaf seeds its own singleton cluster, then merge passes run
/// to a fixed point. When `rng` is given, node traversal order and
/// sibling order under non-array parents are shuffled; sibling order
/// under array parents always stays index order so the adjacency
/// check stays meaningful. The timeout is checked once per full pass,
/// so an attempt can overrun by up to one pass before failing with
/// [`SplitError::Timeout`].
///
/// Cluster order in the result is not significant.
pub fn create_clusters<R: Rng>(
    graph: &Graph,
    max_weight: u64,
    weight: &WeightFn,
    mut rng: Option<&mut R>,
    timeout: Option<Duration>,
) -> Result<Vec<Cluster>, SplitError> {
    let started = Instant::now();

    let mut node_ids: Vec<NodeId> = graph.node_ids().cloned().collect();
    if let Some(rng) = rng.as_deref_mut() {
        node_ids.shuffle(rng);
    }

    // Arena of clusters by index plus node→index assignment; merges
    // tombstone the absorbed entry and repoint its members.
    let mut clusters: Vec<Option<Cluster>> = Vec::new();
    let mut cluster_of: HashMap<NodeId, usize> = HashMap::new();

    let mut weight_cache = WeightCache::new();
    let mut reconstruct_cache = ReconstructCache::new();

    for node_id in &node_ids {
        if !graph.is_leaf(node_id) {
            continue;
        }
        let node = lookup(graph, node_id)?;
        let candidate = ClusterCandidate {
            path: node.path.clone(),
            value: node.value.clone(),
            child_keys: None,
        };
        let evaluated = weight_cached(&mut weight_cache, weight, &candidate)?;
        cluster_of.insert(node_id.clone(), clusters.len());
        clusters.push(Some(Cluster::from_candidate(candidate, evaluated)));
    }

    let mut changed = true;
    while changed {
        if let Some(limit) = timeout {
            if started.elapsed() > limit {
                return Err(SplitError::Timeout);
            }
        }
        changed = false;

        for node_id in &node_ids {
            let Some(&node_cluster) = cluster_of.get(node_id) else {
                continue;
            };
            // Merging happens under a shared unclustered parent; once
            // the parent is absorbed somewhere, this node is interior.
            let Some(parent_id) = graph.parent(node_id) else {
                continue;
            };
            if cluster_of.contains_key(parent_id) {
                continue;
            }
            let parent = lookup(graph, parent_id)?;

            let mut siblings: Vec<&NodeId> = graph
                .children(parent_id)
                .iter()
                .filter(|child| *child != node_id)
                .collect();
            if parent.kind != NodeKind::Array {
                if let Some(rng) = rng.as_deref_mut() {
                    siblings.shuffle(rng);
                }
            }

            for &sibling_id in &siblings {
                let Some(&sibling_cluster) = cluster_of.get(sibling_id) else {
                    continue;
                };
                if sibling_cluster == node_cluster {
                    continue;
                }

                if parent.kind == NodeKind::Array {
                    let node_index = trailing_index(graph, node_id)?;
                    let sibling_index = trailing_index(graph, sibling_id)?;
                    if node_index.abs_diff(sibling_index) != 1 {
                        continue;
                    }
                }

                // Union of both clusters' members, in document order
                // so reconstruction input is canonical.
                let combined: Vec<NodeId> = node_ids_in_clusters(
                    graph,
                    &cluster_of,
                    node_cluster,
                    sibling_cluster,
                );
                let candidate = reconstruct_cached(&mut reconstruct_cache, graph, &combined)?;
                let evaluated = weight_cached(&mut weight_cache, weight, &candidate)?;
                if evaluated > max_weight {
                    continue;
                }

                clusters[node_cluster] = Some(Cluster::from_candidate(candidate, evaluated));
                clusters[sibling_cluster] = None;
                for assigned in cluster_of.values_mut() {
                    if *assigned == sibling_cluster {
                        *assigned = node_cluster;
                    }
                }
                changed = true;
            }

            // Promotion: absorb the parent once every sibling shares
            // this node's cluster. An unassigned sibling disqualifies
            // (its lookup yields no index to compare equal).
            let all_siblings_here = siblings
                .iter()
                .all(|sibling| cluster_of.get(*sibling) == Some(&node_cluster));
            if all_siblings_here {
                let mut combined = Vec::with_capacity(siblings.len() + 2);
                combined.push(node_id.clone());
                combined.push(parent_id.clone());
                combined.extend(siblings.iter().map(|id| (*id).clone()));

                let candidate = reconstruct_cached(&mut reconstruct_cache, graph, &combined)?;
                let evaluated = weight_cached(&mut weight_cache, weight, &candidate)?;
                if evaluated <= max_weight {
                    clusters[node_cluster] = Some(Cluster::from_candidate(candidate, evaluated));
                    cluster_of.insert(parent_id.clone(), node_cluster);
                    changed = true;
                }
            }
        }
    }

    Ok(clusters.into_iter().flatten().collect())
}

fn trailing_index(graph: &Graph, id: &NodeId) -> Result<usize, SplitError> {
    lookup(graph, id)?
        .path
        .last()
        .and_then(Segment::as_index)
        .ok_or_else(|| SplitError::ChildKindMismatch(id.clone()))
}

fn node_ids_in_clusters(
    graph: &Graph,
    cluster_of: &HashMap<NodeId, usize>,
    first: usize,
    second: usize,
) -> Vec<NodeId> {
    graph
        .node_ids()
        .filter(|id| matches!(cluster_of.get(*id), Some(&index) if index == first || index == second))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use serde_json::json;

    fn sum_of_leaves(value: &Value) -> u64 {
        match value {
            Value::Array(items) => items.iter().map(sum_of_leaves).sum(),
            Value::Object(map) => map.values().map(sum_of_leaves).sum(),
            other => other.as_u64().unwrap_or(0),
        }
    }

    fn leaf_sum_weight(candidate: &ClusterCandidate) -> Result<u64, WeightError> {
        Ok(sum_of_leaves(&candidate.value))
    }

    fn cluster(document: Value, max_weight: u64) -> Vec<Cluster> {
        let graph = build_graph(&document);
        create_clusters::<rand_xoshiro::Xoshiro256StarStar>(
            &graph,
            max_weight,
            &leaf_sum_weight,
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_reconstruct_single_node() {
        let graph = build_graph(&json!({"hello": "world"}));
        let candidate = reconstruct(&["$".to_string()], &graph).unwrap();
        assert_eq!(candidate.path, vec![]);
        assert_eq!(candidate.value, json!({"hello": "world"}));
        assert_eq!(candidate.child_keys, None);
    }

    #[test]
    fn test_reconstruct_partial_array() {
        let graph = build_graph(&json!(["one", "two", "three"]));
        let candidate = reconstruct(&["$[1]".to_string(), "$[2]".to_string()], &graph).unwrap();
        assert_eq!(candidate.path, vec![]);
        assert_eq!(candidate.value, json!(["two", "three"]));
        assert_eq!(
            candidate.child_keys,
            Some(ChildKeys::from([Segment::Index(1), Segment::Index(2)]))
        );
    }

    #[test]
    fn test_reconstruct_array_sorts_by_index() {
        let graph = build_graph(&json!(["one", "two", "three"]));
        let candidate = reconstruct(&["$[2]".to_string(), "$[1]".to_string()], &graph).unwrap();
        assert_eq!(candidate.value, json!(["two", "three"]));
    }

    #[test]
    fn test_reconstruct_partial_object() {
        let graph = build_graph(&json!({
            "one": 1,
            "two": 2,
            "three": {"nested": 3}
        }));
        let candidate = reconstruct(&["$.two".to_string(), "$.three".to_string()], &graph).unwrap();
        assert_eq!(candidate.path, vec![]);
        assert_eq!(candidate.value, json!({"two": 2, "three": {"nested": 3}}));
        assert_eq!(
            candidate.child_keys,
            Some(ChildKeys::from([Segment::key("two"), Segment::key("three")]))
        );
    }

    #[test]
    fn test_reconstruct_collapses_merged_parent() {
        // A parent id travelling with its children reduces to the
        // parent alone: the full subtree, no child_keys.
        let graph = build_graph(&json!({"nested": {"b": 2, "c": 3}}));
        let candidate = reconstruct(
            &[
                "$.nested.b".to_string(),
                "$.nested".to_string(),
                "$.nested.c".to_string(),
            ],
            &graph,
        )
        .unwrap();
        assert_eq!(candidate.path, vec![Segment::key("nested")]);
        assert_eq!(candidate.value, json!({"b": 2, "c": 3}));
        assert_eq!(candidate.child_keys, None);
    }

    #[test]
    fn test_reconstruct_unknown_node() {
        let graph = build_graph(&json!({"a": 1}));
        let result = reconstruct(&["$.missing".to_string()], &graph);
        assert!(matches!(result, Err(SplitError::UnknownNode(_))));
    }

    #[test]
    fn test_two_clusters_if_cannot_combine() {
        let clusters = cluster(json!({"one": 1, "two": 2}), 2);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].weight, 1);
        assert_eq!(clusters[0].path, vec![Segment::key("one")]);
        assert_eq!(clusters[1].weight, 2);
        assert_eq!(clusters[1].path, vec![Segment::key("two")]);
    }

    #[test]
    fn test_one_cluster_if_can_combine() {
        let clusters = cluster(json!({"one": 1, "two": 2}), 3);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].weight, 3);
        assert_eq!(clusters[0].path, vec![]);
        assert_eq!(clusters[0].value, json!({"one": 1, "two": 2}));
    }

    #[test]
    fn test_promotes_parent_when_all_children_clustered() {
        let document = json!({"a": 1, "nested": {"b": 2, "c": 3}});
        let clusters = cluster(document.clone(), 6);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].path, vec![]);
        assert_eq!(clusters[0].weight, 6);
        assert_eq!(clusters[0].value, document);
        assert_eq!(clusters[0].child_keys, None);
    }

    #[test]
    fn test_no_promotion_when_children_split() {
        // No pair fits the budget, so nothing merges and no parent
        // can be absorbed.
        let clusters = cluster(json!({"a": 1, "nested": {"b": 2, "c": 3}}), 3);
        assert_eq!(clusters.len(), 3);

        let expected = [
            (vec![Segment::key("a")], 1),
            (vec![Segment::key("nested"), Segment::key("b")], 2),
            (vec![Segment::key("nested"), Segment::key("c")], 3),
        ];
        for (path, weight) in expected {
            assert!(
                clusters.iter().any(|c| c.path == path && c.weight == weight),
                "missing cluster at {path:?}"
            );
        }
    }

    #[test]
    fn test_keeps_array_order() {
        // Indices 0 and 2 fit the budget together but index 1
        // separates them; contiguity forbids the merge.
        let clusters = cluster(json!([{"a": 1}, {"b": 3}, {"c": 2}]), 3);
        assert_eq!(clusters.len(), 3);

        let expected = [
            (vec![Segment::Index(0)], 1, json!({"a": 1})),
            (vec![Segment::Index(1)], 3, json!({"b": 3})),
            (vec![Segment::Index(2)], 2, json!({"c": 2})),
        ];
        for (path, weight, value) in expected {
            assert!(
                clusters
                    .iter()
                    .any(|c| c.path == path && c.weight == weight && c.value == value),
                "missing cluster at {path:?}"
            );
        }
    }

    #[test]
    fn test_contiguous_array_prefix_merges() {
        let data = json!([
            {"key1": 1, "key2": 1},
            {"key3": 1, "key4": 1},
            {"key5": 1, "key6": 2}
        ]);
        let clusters = cluster(data.clone(), 5);
        assert_eq!(clusters.len(), 2);

        let merged = clusters
            .iter()
            .find(|c| c.child_keys.is_some())
            .expect("expected a partial array cluster");
        assert_eq!(merged.path, vec![]);
        assert_eq!(merged.weight, 4);
        assert_eq!(
            merged.child_keys,
            Some(ChildKeys::from([Segment::Index(0), Segment::Index(1)]))
        );
        assert_eq!(merged.value, json!([{"key1": 1, "key2": 1}, {"key3": 1, "key4": 1}]));

        assert!(clusters
            .iter()
            .any(|c| c.path == vec![Segment::Index(2)] && c.weight == 3));
    }

    #[test]
    fn test_oversized_leaf_is_singleton() {
        let clusters = cluster(json!({"big": 10, "small": 1}), 4);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().any(|c| c.weight == 10));
    }

    #[test]
    fn test_single_scalar_document() {
        let clusters = cluster(json!(7), 100);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].path, vec![]);
        assert_eq!(clusters[0].weight, 7);
        assert_eq!(clusters[0].child_keys, None);
    }

    #[test]
    fn test_empty_object_root_is_single_cluster() {
        // A childless root has no outgoing edges, so it seeds as its
        // own leaf cluster like any other empty container.
        let clusters = cluster(json!({}), 100);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].path, vec![]);
        assert_eq!(clusters[0].value, json!({}));
        assert_eq!(clusters[0].child_keys, None);
        assert_eq!(clusters[0].weight, 0);
    }

    #[test]
    fn test_timeout_fails_attempt() {
        let graph = build_graph(&json!({"a": 1, "b": 2, "c": 3}));
        let result = create_clusters::<rand_xoshiro::Xoshiro256StarStar>(
            &graph,
            100,
            &|candidate| {
                std::thread::sleep(Duration::from_millis(5));
                leaf_sum_weight(candidate)
            },
            None,
            Some(Duration::ZERO),
        );
        assert!(matches!(result, Err(SplitError::Timeout)));
    }

    #[test]
    fn test_weight_error_propagates() {
        let graph = build_graph(&json!({"a": 1}));
        let result = create_clusters::<rand_xoshiro::Xoshiro256StarStar>(
            &graph,
            100,
            &|_| Err("tokenizer unavailable".into()),
            None,
            None,
        );
        assert!(matches!(result, Err(SplitError::Weight(_))));
    }
}
