//! Structural graph built from a JSON document.
//!
//! The graph is a rooted tree: one node per value in the document,
//! keyed by node identifier, with an edge from every container to each
//! of its elements. It is built once per document and never mutated
//! afterwards; the clusterer only reads it.

use indexmap::IndexMap;
use json_splitter_node_path::{format_node_id, NodeId, NodePath, Segment};
use serde_json::Value;
use std::collections::HashMap;

/// Classification of a node, derived from its value at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A JSON array.
    Array,
    /// A JSON object.
    Object,
    /// A terminal value: null, boolean, number, or string.
    Scalar,
}

/// A single value in the document together with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Path from the document root to this value.
    pub path: NodePath,
    /// Kind derived from the value; immutable after construction.
    pub kind: NodeKind,
    /// The value itself (the full subtree for containers).
    pub value: Value,
}

/// The structural graph of one document.
///
/// Nodes iterate in document order (parents before children, object
/// keys and array elements in their original order), which keeps the
/// unrandomized clustering pass reproducible.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    edges: Vec<(NodeId, NodeId)>,
    parent: HashMap<NodeId, NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl Graph {
    /// Look up a node by identifier.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether the graph contains the given identifier.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All node identifiers in document order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// All `(id, node)` pairs in document order.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All parent→child edges in insertion order.
    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    /// The single structural parent of a node, if it is not the root.
    pub fn parent(&self, id: &str) -> Option<&NodeId> {
        self.parent.get(id)
    }

    /// The children of a node in element/key order. Empty for scalars.
    pub fn children(&self, id: &str) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a node has no outgoing edges.
    ///
    /// Childless containers (empty arrays and objects) count as
    /// leaves: leaf status is about edges, not kind.
    pub fn is_leaf(&self, id: &str) -> bool {
        self.children(id).is_empty()
    }

    fn insert(&mut self, id: NodeId, node: Node) {
        self.nodes.insert(id, node);
    }

    fn connect(&mut self, parent_id: &NodeId, child_id: &NodeId) {
        self.edges.push((parent_id.clone(), child_id.clone()));
        self.parent.insert(child_id.clone(), parent_id.clone());
        self.children
            .entry(parent_id.clone())
            .or_default()
            .push(child_id.clone());
    }
}

/// Build the structural graph of a document.
///
/// # Example
///
/// ```
/// use json_splitter::graph::{build_graph, NodeKind};
/// use serde_json::json;
///
/// let graph = build_graph(&json!({"hello": "world", "nested": {"key": "value"}}));
/// assert_eq!(graph.len(), 4);
/// assert_eq!(graph.node("$.nested").unwrap().kind, NodeKind::Object);
/// assert_eq!(graph.node("$.nested.key").unwrap().value, json!("value"));
/// ```
pub fn build_graph(value: &Value) -> Graph {
    let mut graph = Graph::default();
    add_value(&mut graph, value, Vec::new());
    graph
}

fn add_value(graph: &mut Graph, value: &Value, path: NodePath) -> NodeId {
    let id = format_node_id(&path);
    match value {
        Value::Object(map) => {
            graph.insert(
                id.clone(),
                Node {
                    path: path.clone(),
                    kind: NodeKind::Object,
                    value: value.clone(),
                },
            );
            for (key, sub_value) in map {
                let mut child_path = path.clone();
                child_path.push(Segment::key(key.as_str()));
                let child_id = add_value(graph, sub_value, child_path);
                graph.connect(&id, &child_id);
            }
        }
        Value::Array(items) => {
            graph.insert(
                id.clone(),
                Node {
                    path: path.clone(),
                    kind: NodeKind::Array,
                    value: value.clone(),
                },
            );
            for (index, sub_value) in items.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(Segment::Index(index));
                let child_id = add_value(graph, sub_value, child_path);
                graph.connect(&id, &child_id);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            graph.insert(
                id.clone(),
                Node {
                    path,
                    kind: NodeKind::Scalar,
                    value: value.clone(),
                },
            );
        }
    }
    id
}
