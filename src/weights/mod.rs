//! Spatial weights
//!
//! Brute-force k-nearest-neighbor search over weighted points and the
//! row-wise k-neighbor weight matrix built from it. Every query is an
//! all-pairs scan; inputs are expected to be city scale.

use crate::error::{Error, Result};
use crate::geometry::{distance_between, WeightedPoint};
use serde::{Deserialize, Serialize};

/// A neighbor of a query point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborRecord {
    /// Index into the source collection
    pub index: usize,
    /// Great-circle distance from the query point in kilometers
    pub distance: f64,
    /// Copy of the neighbor
    pub point: WeightedPoint,
}

/// How a neighbor's distance turns into a weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightType {
    /// Every neighbor weighs 1
    Equal,
    /// Raw distance in kilometers
    Distance,
    /// 1 / distance, with coincident points weighing 1
    #[default]
    InverseDistance,
}

impl WeightType {
    /// Weight for a neighbor at `distance` kilometers
    pub fn weight(&self, distance: f64) -> f64 {
        match self {
            Self::Equal => 1.0,
            Self::Distance => distance,
            Self::InverseDistance => {
                if distance == 0.0 {
                    1.0
                } else {
                    1.0 / distance
                }
            }
        }
    }
}

impl std::fmt::Display for WeightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equal => write!(f, "equal"),
            Self::Distance => write!(f, "distance"),
            Self::InverseDistance => write!(f, "inverse_distance"),
        }
    }
}

impl std::str::FromStr for WeightType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equal" => Ok(Self::Equal),
            "distance" => Ok(Self::Distance),
            "inverse_distance" | "inverse-distance" | "idw" => Ok(Self::InverseDistance),
            _ => Err(format!("Unknown weight type: {}", s)),
        }
    }
}

/// Find the `k` nearest neighbors of `points[query_index]`
///
/// # Returns
/// Neighbors sorted by ascending distance, ties kept in index order.
/// Empty when the index is out of range, the input is empty, or `k` is 0.
/// Fewer than `k` records when fewer neighbors exist.
pub fn k_nearest_neighbors(points: &[WeightedPoint], query_index: usize, k: usize) -> Vec<NeighborRecord> {
    let Some(query) = points.get(query_index) else {
        return Vec::new();
    };

    let mut neighbors: Vec<NeighborRecord> = points
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != query_index)
        .map(|(index, point)| NeighborRecord {
            index,
            distance: distance_between(query.coords(), point.coords()),
            point: *point,
        })
        .collect();

    // sort_by is stable, so equal distances keep index order
    neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    neighbors.truncate(k);
    neighbors
}

/// Like [`k_nearest_neighbors`] but reports an out-of-range index
pub fn try_k_nearest_neighbors(
    points: &[WeightedPoint],
    query_index: usize,
    k: usize,
) -> Result<Vec<NeighborRecord>> {
    if query_index >= points.len() {
        return Err(Error::IndexOutOfRange {
            index: query_index,
            len: points.len(),
        });
    }
    Ok(k_nearest_neighbors(points, query_index, k))
}

/// k-nearest neighbors of every point, in input order
pub fn all_k_nearest_neighbors(points: &[WeightedPoint], k: usize) -> Vec<Vec<NeighborRecord>> {
    (0..points.len())
        .map(|i| k_nearest_neighbors(points, i, k))
        .collect()
}

/// Build the n×n k-neighbor weight matrix
///
/// Row `i` holds weights only at the columns of `i`'s k nearest neighbors;
/// every other entry, including the diagonal, is 0. The matrix is not
/// symmetric in general.
pub fn weight_matrix(points: &[WeightedPoint], k: usize, weight_type: WeightType) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut matrix = vec![vec![0.0; n]; n];

    for (i, row) in matrix.iter_mut().enumerate() {
        for neighbor in k_nearest_neighbors(points, i, k) {
            row[neighbor.index] = weight_type.weight(neighbor.distance);
        }
    }

    matrix
}
