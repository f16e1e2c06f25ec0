//! Multi-start sampling over randomized clustering attempts.
//!
//! The greedy clusterer is order-sensitive, so repeated attempts
//! under shuffled traversal orders explore different merge sequences.
//! The first attempt always runs unrandomized for a reproducible
//! baseline; the rest share a single PRNG seeded once from the
//! caller's seed, advancing across attempts.

use crate::cluster::{create_clusters, Cluster, SplitError};
use crate::graph::Graph;
use crate::weight::WeightFn;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use std::time::Duration;

/// Run the clusterer `max_iterations` times and keep the best attempt.
///
/// Each attempt receives an equal share of `timeout`; a single attempt
/// timing out fails the whole call with [`SplitError::Timeout`].
/// Selection minimizes `(cluster count, population standard deviation
/// of cluster weights)`: fewer clusters wins, and among equal counts
/// the more evenly balanced partition wins, earliest attempt on ties.
///
/// `max_iterations` below 1 is treated as 1.
pub fn sample_clusters(
    graph: &Graph,
    max_weight: u64,
    weight: &WeightFn,
    max_iterations: usize,
    timeout: Option<Duration>,
    seed: u64,
) -> Result<Vec<Cluster>, SplitError> {
    let iterations = max_iterations.max(1);
    let attempt_timeout = timeout.map(|total| total / iterations as u32);
    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);

    let mut best: Option<(usize, f64, Vec<Cluster>)> = None;
    for iteration in 0..iterations {
        let attempt = if iteration == 0 {
            create_clusters::<Xoshiro256StarStar>(graph, max_weight, weight, None, attempt_timeout)?
        } else {
            create_clusters(graph, max_weight, weight, Some(&mut rng), attempt_timeout)?
        };

        let count = attempt.len();
        let spread = weight_std(&attempt);
        let better = match &best {
            None => true,
            Some((best_count, best_spread, _)) => {
                count < *best_count || (count == *best_count && spread < *best_spread)
            }
        };
        if better {
            best = Some((count, spread, attempt));
        }
    }

    Ok(best.map(|(_, _, clusters)| clusters).unwrap_or_default())
}

/// Population standard deviation of cluster weights.
fn weight_std(clusters: &[Cluster]) -> f64 {
    if clusters.is_empty() {
        return 0.0;
    }
    let count = clusters.len() as f64;
    let mean = clusters.iter().map(|c| c.weight as f64).sum::<f64>() / count;
    let variance = clusters
        .iter()
        .map(|c| {
            let delta = c.weight as f64 - mean;
            delta * delta
        })
        .sum::<f64>()
        / count;
    variance.sqrt()
}
