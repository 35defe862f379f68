//! Density-based clustering
//!
//! DBSCAN over great-circle distances with a brute-force region query.
//! Labels are assigned in discovery order starting at 0; `NOISE` marks
//! points that belong to no cluster.

use crate::geometry::{distance_between, Coordinates};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Label of points that belong to no cluster
pub const NOISE: i64 = -1;

/// Counts derived from a label vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbscanSummary {
    pub cluster_count: usize,
    pub noise_count: usize,
}

impl DbscanSummary {
    /// Summarize DBSCAN labels
    pub fn from_labels(labels: &[i64]) -> Self {
        let cluster_count = labels
            .iter()
            .copied()
            .max()
            .map_or(0, |max| if max < 0 { 0 } else { max as usize + 1 });
        let noise_count = labels.iter().filter(|l| **l == NOISE).count();
        Self {
            cluster_count,
            noise_count,
        }
    }
}

/// Indices of every point within `eps_km` of `points[i]`, including `i`
fn region_query(points: &[Coordinates], i: usize, eps_km: f64) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| distance_between(points[i], **p) <= eps_km)
        .map(|(j, _)| j)
        .collect()
}

/// Cluster points by density
///
/// # Arguments
/// * `points` - Points to cluster
/// * `eps_km` - Neighborhood radius in kilometers
/// * `min_pts` - Minimum neighborhood size (the point itself included) for
///   a core point
///
/// # Returns
/// One label per input point, in input order. A point keeps the first
/// cluster label it receives; a point first marked as noise may still be
/// claimed later as the border of a cluster.
pub fn dbscan(points: &[Coordinates], eps_km: f64, min_pts: usize) -> Vec<i64> {
    let n = points.len();
    let mut labels = vec![NOISE; n];
    let mut visited = vec![false; n];
    let mut next_cluster: i64 = 0;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let neighbors = region_query(points, i, eps_km);
        if neighbors.len() < min_pts {
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[i] = cluster;

        let mut queue: VecDeque<usize> = neighbors.into();
        while let Some(j) = queue.pop_front() {
            if labels[j] == NOISE {
                labels[j] = cluster;
            }
            if visited[j] {
                continue;
            }
            visited[j] = true;

            let expansion = region_query(points, j, eps_km);
            if expansion.len() >= min_pts {
                for k in expansion {
                    if labels[k] == NOISE {
                        labels[k] = cluster;
                    }
                    if !visited[k] {
                        queue.push_back(k);
                    }
                }
            }
        }
    }

    debug!(
        "DBSCAN eps={}km min_pts={} on {} points: {} clusters",
        eps_km, min_pts, n, next_cluster
    );

    labels
}
