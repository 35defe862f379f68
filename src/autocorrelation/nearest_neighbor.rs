//! Clark-Evans nearest neighbor index

use crate::constants::{geo::KM_PER_DEGREE, stats};
use crate::geometry::{bounds, Coordinates, WeightedPoint};
use crate::weights::k_nearest_neighbors;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Point pattern classification from the NNI z-score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternInterpretation {
    Clustered,
    #[default]
    Random,
    Dispersed,
}

impl std::fmt::Display for PatternInterpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clustered => write!(f, "clustered"),
            Self::Random => write!(f, "random"),
            Self::Dispersed => write!(f, "dispersed"),
        }
    }
}

/// Result of the nearest neighbor analysis, distances in kilometers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NearestNeighborIndex {
    pub average_distance: f64,
    pub random_expectation: f64,
    pub z_score: f64,
    pub interpretation: PatternInterpretation,
}

impl NearestNeighborIndex {
    /// Observed over expected mean distance; 0 when undefined
    pub fn ratio(&self) -> f64 {
        if self.random_expectation == 0.0 {
            0.0
        } else {
            self.average_distance / self.random_expectation
        }
    }
}

/// Compare the mean nearest neighbor distance with a random pattern over the
/// bounding box of the points
///
/// # Returns
/// All zeros and `Random` for fewer than 2 points or a zero-area bounding box
pub fn nearest_neighbor_index(points: &[WeightedPoint]) -> NearestNeighborIndex {
    let n = points.len();
    if n < 2 {
        return NearestNeighborIndex::default();
    }

    let coords: Vec<Coordinates> = points.iter().map(WeightedPoint::coords).collect();
    let extent = bounds(&coords);
    let mid_lat = (extent.min_lat + extent.max_lat) / 2.0;
    let width_km = extent.width() * KM_PER_DEGREE * mid_lat.to_radians().cos();
    let height_km = extent.height() * KM_PER_DEGREE;
    let area = width_km * height_km;
    if area <= 0.0 {
        return NearestNeighborIndex::default();
    }

    let total: f64 = (0..n)
        .filter_map(|i| k_nearest_neighbors(points, i, 1).first().map(|r| r.distance))
        .sum();
    let average_distance = total / n as f64;

    let density = n as f64 / area;
    let random_expectation = 0.5 / density.sqrt();
    let standard_error = stats::NNI_STANDARD_ERROR_COEFF * (1.0 / (n as f64 * density)).sqrt();
    let z_score = (average_distance - random_expectation) / standard_error;

    let interpretation = if z_score < -stats::Z_CRITICAL_95 {
        PatternInterpretation::Clustered
    } else if z_score > stats::Z_CRITICAL_95 {
        PatternInterpretation::Dispersed
    } else {
        PatternInterpretation::Random
    };

    debug!(
        "Nearest neighbor index on {} points: mean {:.4}km, z={:.3} ({})",
        n, average_distance, z_score, interpretation
    );

    NearestNeighborIndex {
        average_distance,
        random_expectation,
        z_score,
        interpretation,
    }
}
