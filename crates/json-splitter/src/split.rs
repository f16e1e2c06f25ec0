//! Public entry point: split a document into weight-bounded clusters.

use crate::cluster::{Cluster, SplitError};
use crate::graph::build_graph;
use crate::sample::sample_clusters;
use crate::weight::{serialized_weight, WeightFn};
use serde_json::Value;
use std::time::Duration;

/// Options for [`split`] and [`split_with`].
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Weight budget per cluster. Every leaf that fits individually
    /// ends up in a cluster within this budget; a leaf that alone
    /// exceeds it becomes an oversized singleton cluster rather than
    /// an error.
    pub max_weight: u64,
    /// Number of randomized sampling attempts (at least 1).
    pub max_iterations: usize,
    /// Overall wall-clock budget, divided evenly across attempts.
    pub timeout: Option<Duration>,
    /// Seed for reproducible randomized exploration.
    pub seed: u64,
}

impl SplitOptions {
    /// Options with the given budget and the defaults: 10 iterations,
    /// no timeout, seed 42.
    pub fn new(max_weight: u64) -> Self {
        SplitOptions {
            max_weight,
            max_iterations: 10,
            timeout: None,
            seed: 42,
        }
    }
}

/// Split a document into clusters using the default weight function
/// (serialized JSON length in bytes).
///
/// The returned clusters' leaf sets partition the document exactly:
/// every terminal value is covered by exactly one cluster.
///
/// # Example
///
/// ```
/// use json_splitter::{split, SplitOptions};
/// use serde_json::json;
///
/// let document = json!({"a": [1, 2, 3], "b": {"c": "hello", "d": "world"}});
/// let clusters = split(&document, &SplitOptions::new(20)).unwrap();
///
/// assert!(!clusters.is_empty());
/// for cluster in &clusters {
///     assert!(cluster.weight <= 20);
/// }
/// ```
pub fn split(document: &Value, options: &SplitOptions) -> Result<Vec<Cluster>, SplitError> {
    split_with(document, options, &serialized_weight)
}

/// Split a document using a caller-supplied weight function.
///
/// The weight function is treated as a black box; any error it
/// returns propagates unchanged inside [`SplitError::Weight`].
pub fn split_with(
    document: &Value,
    options: &SplitOptions,
    weight: &WeightFn,
) -> Result<Vec<Cluster>, SplitError> {
    let graph = build_graph(document);
    sample_clusters(
        &graph,
        options.max_weight,
        weight,
        options.max_iterations,
        options.timeout,
        options.seed,
    )
}
