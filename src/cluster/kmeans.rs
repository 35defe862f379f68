//! K-means clustering
//!
//! Centroids are initialized by sampling input points uniformly with
//! replacement from an injected random source, so two initial centroids
//! may coincide. Assignment uses great-circle distance; a cluster that ends
//! up empty keeps its previous centroid.

use crate::constants::stats::KMEANS_TOLERANCE_KM;
use crate::error::Result;
use crate::geometry::{centroid, distance_between, Coordinates};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default iteration cap
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// A point assigned to a cluster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    /// Index into the input points
    pub index: usize,
    pub point: Coordinates,
}

/// Result of a K-means run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansResult {
    /// Members of each cluster; always `k` entries, some possibly empty
    pub clusters: Vec<Vec<ClusterMember>>,
    /// Final centroid of each cluster
    pub centroids: Vec<Coordinates>,
    /// Number of update steps performed
    pub iterations: usize,
    /// True if every centroid moved less than 1 m in the last step
    pub converged: bool,
}

/// Run K-means over geographic points
///
/// # Arguments
/// * `points` - Points to cluster
/// * `k` - Number of clusters
/// * `max_iterations` - Upper bound on update steps
/// * `rng` - Source used to pick the initial centroids
///
/// # Returns
/// `k` clusters and their centroids. Empty input or `k == 0` yields `k`
/// empty clusters and no centroids.
pub fn kmeans(
    points: &[Coordinates],
    k: usize,
    max_iterations: usize,
    rng: &dyn RandomSource,
) -> Result<KMeansResult> {
    if points.is_empty() || k == 0 {
        return Ok(KMeansResult {
            clusters: vec![Vec::new(); k],
            centroids: Vec::new(),
            iterations: 0,
            converged: false,
        });
    }

    let mut centroids: Vec<Coordinates> = rng
        .indices(k, points.len())?
        .into_iter()
        .map(|i| points[i])
        .collect();
    let mut assignments = assign(points, &centroids);

    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        let updated = update_centroids(points, &assignments, &centroids);
        let max_shift = centroids
            .iter()
            .zip(&updated)
            .map(|(old, new)| distance_between(*old, *new))
            .fold(0.0, f64::max);

        centroids = updated;
        assignments = assign(points, &centroids);

        if max_shift < KMEANS_TOLERANCE_KM {
            converged = true;
            break;
        }
    }

    debug!(
        "K-means k={} on {} points: {} iterations, converged={}",
        k,
        points.len(),
        iterations,
        converged
    );

    let mut clusters = vec![Vec::new(); k];
    for (index, (&cluster, &point)) in assignments.iter().zip(points).enumerate() {
        clusters[cluster].push(ClusterMember { index, point });
    }

    Ok(KMeansResult {
        clusters,
        centroids,
        iterations,
        converged,
    })
}

/// Index of the nearest centroid for every point; ties go to the lower index
fn assign(points: &[Coordinates], centroids: &[Coordinates]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (i, c) in centroids.iter().enumerate() {
                let d = distance_between(*p, *c);
                if d < best_distance {
                    best = i;
                    best_distance = d;
                }
            }
            best
        })
        .collect()
}

fn update_centroids(
    points: &[Coordinates],
    assignments: &[usize],
    previous: &[Coordinates],
) -> Vec<Coordinates> {
    previous
        .iter()
        .enumerate()
        .map(|(cluster, old)| {
            let members: Vec<Coordinates> = points
                .iter()
                .zip(assignments)
                .filter(|(_, a)| **a == cluster)
                .map(|(p, _)| *p)
                .collect();
            if members.is_empty() {
                *old
            } else {
                centroid(&members)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::pseudo::SeededSource;
    use std::sync::Mutex;

    /// Replays a fixed list of floats
    struct FixedSource(Mutex<Vec<f64>>);

    impl RandomSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn floats(&self, n: usize) -> Result<Vec<f64>> {
            let mut values = self.0.lock().unwrap();
            Ok(values.drain(..n).collect())
        }
    }

    /// Tight group of `count` points around a center (~100 m spread)
    fn group(lng: f64, lat: f64, count: usize) -> Vec<Coordinates> {
        (0..count)
            .map(|i| {
                let angle = i as f64 * 0.7;
                Coordinates::new(lng + 0.001 * angle.cos(), lat + 0.001 * angle.sin())
            })
            .collect()
    }

    fn labels_of(result: &KMeansResult, n: usize) -> Vec<usize> {
        let mut labels = vec![usize::MAX; n];
        for (c, members) in result.clusters.iter().enumerate() {
            for m in members {
                labels[m.index] = c;
            }
        }
        labels
    }

    #[test]
    fn test_recovers_two_groups_for_any_seed() {
        let mut points = group(120.20, 23.00, 10);
        points.extend(group(121.50, 25.00, 10));

        for seed in 0..10 {
            let source = SeededSource::new(seed);
            let result = kmeans(&points, 2, DEFAULT_MAX_ITERATIONS, &source).unwrap();
            let labels = labels_of(&result, points.len());

            assert_eq!(result.clusters.len(), 2);
            assert!(labels[..10].iter().all(|l| *l == labels[0]), "seed {}", seed);
            assert!(labels[10..].iter().all(|l| *l == labels[10]), "seed {}", seed);
            assert_ne!(labels[0], labels[10], "seed {}", seed);
            assert!(result.converged);
        }
    }

    #[test]
    fn test_recovers_three_groups_with_fixed_init() {
        let mut points = group(120.20, 23.00, 8);
        points.extend(group(121.50, 25.00, 8));
        points.extend(group(120.60, 22.60, 8));

        // Picks indices 0, 8 and 16: one seed point per group
        let source = FixedSource(Mutex::new(vec![0.0, 8.0 / 24.0 + 0.001, 16.0 / 24.0 + 0.001]));
        let result = kmeans(&points, 3, DEFAULT_MAX_ITERATIONS, &source).unwrap();
        let labels = labels_of(&result, points.len());

        assert_eq!(&labels[..8], &[0; 8]);
        assert_eq!(&labels[8..16], &[1; 8]);
        assert_eq!(&labels[16..], &[2; 8]);
        assert_eq!(result.centroids.len(), 3);
        assert!((result.centroids[1].lat - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_cluster_count_equals_k() {
        let points = group(120.2, 23.0, 3);
        let source = SeededSource::new(7);
        let result = kmeans(&points, 5, DEFAULT_MAX_ITERATIONS, &source).unwrap();

        assert_eq!(result.clusters.len(), 5);
        assert_eq!(result.centroids.len(), 5);
        let total: usize = result.clusters.iter().map(|c| c.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_respects_max_iterations() {
        let mut points = group(120.20, 23.00, 20);
        points.extend(group(120.25, 23.05, 20));
        let source = SeededSource::new(3);

        let result = kmeans(&points, 4, 1, &source).unwrap();
        assert!(result.iterations <= 1);

        let none = kmeans(&points, 2, 0, &SeededSource::new(3)).unwrap();
        assert_eq!(none.iterations, 0);
        assert!(!none.converged);
        let total: usize = none.clusters.iter().map(|c| c.len()).sum();
        assert_eq!(total, points.len());
    }

    #[test]
    fn test_duplicate_initial_centroids() {
        let mut points = group(120.20, 23.00, 5);
        points.extend(group(121.50, 25.00, 5));

        // Both initial centroids are point 0
        let source = FixedSource(Mutex::new(vec![0.0, 0.0]));
        let result = kmeans(&points, 2, DEFAULT_MAX_ITERATIONS, &source).unwrap();
        let labels = labels_of(&result, points.len());

        assert_ne!(labels[0], labels[5]);
        assert!(labels[..5].iter().all(|l| *l == labels[0]));
        assert!(labels[5..].iter().all(|l| *l == labels[5]));
    }

    #[test]
    fn test_empty_input() {
        let source = SeededSource::new(1);
        let result = kmeans(&[], 3, DEFAULT_MAX_ITERATIONS, &source).unwrap();
        assert_eq!(result.clusters.len(), 3);
        assert!(result.clusters.iter().all(|c| c.is_empty()));
        assert!(result.centroids.is_empty());

        let zero_k = kmeans(&group(0.0, 0.0, 3), 0, 10, &source).unwrap();
        assert!(zero_k.clusters.is_empty());
    }
}
