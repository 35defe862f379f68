//! Spatial autocorrelation
//!
//! - Global Moran's I over features or weighted points
//! - Spatial lag and local Moran's I (LISA) over k-nearest neighbors
//! - High/low cluster classification from local Moran's I
//! - Clark-Evans nearest neighbor index

pub mod nearest_neighbor;

pub use nearest_neighbor::{nearest_neighbor_index, NearestNeighborIndex, PatternInterpretation};

use crate::geometry::{distance_between, geometry_centroid, Coordinates, WeightedPoint};
use crate::weights::{k_nearest_neighbors, WeightType};
use geojson::Feature;
use serde::{Deserialize, Serialize};

/// Property holding the numeric attribute analysed by the statistics
pub const VALUE_PROPERTY: &str = "value";

/// Weight between two locations, used by global Moran's I
pub type WeightFn<'a> = &'a dyn Fn(&Coordinates, &Coordinates) -> f64;

/// Per-point local Moran's I
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalMoran {
    pub local_morans_i: f64,
    pub spatial_lag: f64,
    /// Deviation of the value from the mean
    pub standardized_value: f64,
}

/// LISA quadrant of a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterType {
    #[serde(rename = "high-high")]
    HighHigh,
    #[serde(rename = "low-low")]
    LowLow,
    #[serde(rename = "high-low")]
    HighLow,
    #[serde(rename = "low-high")]
    LowHigh,
    #[serde(rename = "not-significant")]
    NotSignificant,
}

impl std::fmt::Display for ClusterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighHigh => write!(f, "high-high"),
            Self::LowLow => write!(f, "low-low"),
            Self::HighLow => write!(f, "high-low"),
            Self::LowHigh => write!(f, "low-high"),
            Self::NotSignificant => write!(f, "not-significant"),
        }
    }
}

/// Classification of every point plus the indices in each class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialClusters {
    /// One class per input point
    pub classifications: Vec<ClusterType>,
    pub high_high: Vec<usize>,
    pub low_low: Vec<usize>,
    pub high_low: Vec<usize>,
    pub low_high: Vec<usize>,
    pub not_significant: Vec<usize>,
}

/// Weighted point at a feature's geometry centroid
///
/// The `value` property is used when numeric, otherwise 0. Features without
/// a usable geometry yield `None`.
pub fn feature_point(feature: &Feature) -> Option<WeightedPoint> {
    let center = geometry_centroid(&feature.geometry.as_ref()?.value)?;
    let value = feature
        .properties
        .as_ref()
        .and_then(|p| p.get(VALUE_PROPERTY))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    Some(WeightedPoint::new(center.lng, center.lat, value))
}

fn default_weight(a: &Coordinates, b: &Coordinates) -> f64 {
    WeightType::InverseDistance.weight(distance_between(*a, *b))
}

/// Global Moran's I over features
///
/// Features are located at their geometry centroid. Without a weight
/// function the weight is the inverse great-circle distance between
/// centroids.
pub fn global_morans_i(features: &[Feature], weight_fn: Option<WeightFn<'_>>) -> f64 {
    let points: Vec<WeightedPoint> = features.iter().filter_map(feature_point).collect();
    global_morans_i_points(&points, weight_fn)
}

/// Global Moran's I over weighted points
///
/// `I = (n / S0) · Σ_{i≠j} w_ij z_i z_j / Σ z_i²`
///
/// Returns 0 for fewer than 2 points, zero variance, or zero total weight.
pub fn global_morans_i_points(points: &[WeightedPoint], weight_fn: Option<WeightFn<'_>>) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }

    let weight: WeightFn<'_> = match weight_fn {
        Some(f) => f,
        None => &default_weight,
    };
    let mean = points.iter().map(|p| p.value).sum::<f64>() / n as f64;
    let deviations: Vec<f64> = points.iter().map(|p| p.value - mean).collect();

    let denominator: f64 = deviations.iter().map(|z| z * z).sum();
    if denominator == 0.0 {
        return 0.0;
    }

    let mut numerator = 0.0;
    let mut weight_sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let w = weight(&points[i].coords(), &points[j].coords());
            numerator += w * deviations[i] * deviations[j];
            weight_sum += w;
        }
    }

    if weight_sum == 0.0 {
        return 0.0;
    }

    (n as f64 / weight_sum) * (numerator / denominator)
}

/// Weighted mean of the values of `points[target_index]`'s k nearest
/// neighbors
///
/// Returns 0 for an invalid index, no neighbors, or zero total weight.
pub fn spatial_lag(points: &[WeightedPoint], target_index: usize, k: usize, weight_type: WeightType) -> f64 {
    let neighbors = k_nearest_neighbors(points, target_index, k);

    let (weighted, total) = neighbors.iter().fold((0.0, 0.0), |(sum, total), n| {
        let w = weight_type.weight(n.distance);
        (sum + w * n.point.value, total + w)
    });

    if total == 0.0 {
        0.0
    } else {
        weighted / total
    }
}

/// Local Moran's I for every point over its k nearest neighbors
///
/// Neighbor weights are `1 / (distance + 1)`. The lag is taken over
/// deviations from the mean, and the statistic is divided by the population
/// variance; zero variance gives 0 everywhere.
pub fn local_morans_i(points: &[WeightedPoint], k: usize) -> Vec<LocalMoran> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    let mean = points.iter().map(|p| p.value).sum::<f64>() / n as f64;
    let deviations: Vec<f64> = points.iter().map(|p| p.value - mean).collect();
    let variance = deviations.iter().map(|z| z * z).sum::<f64>() / n as f64;

    (0..n)
        .map(|i| {
            let (weighted, total) = k_nearest_neighbors(points, i, k).iter().fold(
                (0.0, 0.0),
                |(sum, total), neighbor| {
                    let w = 1.0 / (neighbor.distance + 1.0);
                    (sum + w * deviations[neighbor.index], total + w)
                },
            );
            let lag = if total > 0.0 { weighted / total } else { 0.0 };
            let local = if variance == 0.0 {
                0.0
            } else {
                deviations[i] * lag / variance
            };

            LocalMoran {
                local_morans_i: local,
                spatial_lag: lag,
                standardized_value: deviations[i],
            }
        })
        .collect()
}

/// Classify every point into a LISA quadrant
///
/// A point is significant when `|I_i| > threshold`. High means a value
/// above the mean; the neighborhood is high when the spatial lag of
/// deviations is positive.
pub fn detect_spatial_clusters(points: &[WeightedPoint], k: usize, threshold: f64) -> SpatialClusters {
    let mut clusters = SpatialClusters::default();

    for (i, local) in local_morans_i(points, k).iter().enumerate() {
        let class = if local.local_morans_i.abs() <= threshold {
            ClusterType::NotSignificant
        } else {
            match (local.standardized_value > 0.0, local.spatial_lag > 0.0) {
                (true, true) => ClusterType::HighHigh,
                (false, false) => ClusterType::LowLow,
                (true, false) => ClusterType::HighLow,
                (false, true) => ClusterType::LowHigh,
            }
        };

        match class {
            ClusterType::HighHigh => clusters.high_high.push(i),
            ClusterType::LowLow => clusters.low_low.push(i),
            ClusterType::HighLow => clusters.high_low.push(i),
            ClusterType::LowHigh => clusters.low_high.push(i),
            ClusterType::NotSignificant => clusters.not_significant.push(i),
        }
        clusters.classifications.push(class);
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geojson::{Geometry, JsonObject, Value};

    fn feature(lng: f64, lat: f64, value: f64) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert(VALUE_PROPERTY.to_string(), value.into());
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lng, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    /// Points along a parallel, ~1 km apart
    fn line(values: &[f64]) -> Vec<WeightedPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| WeightedPoint::new(120.2 + i as f64 * 0.01, 23.0, *v))
            .collect()
    }

    #[test]
    fn test_global_morans_single_feature_is_zero() {
        assert_eq!(global_morans_i(&[feature(120.2, 23.0, 5.0)], None), 0.0);
        assert_eq!(global_morans_i(&[], None), 0.0);
    }

    #[test]
    fn test_global_morans_zero_variance_is_zero() {
        let features: Vec<Feature> = (0..5).map(|i| feature(120.2 + i as f64 * 0.01, 23.0, 3.0)).collect();
        assert_eq!(global_morans_i(&features, None), 0.0);
    }

    #[test]
    fn test_global_morans_positive_for_smooth_gradient() {
        let points = line(&[1.0, 1.0, 1.0, 5.0, 5.0, 5.0]);
        assert!(global_morans_i_points(&points, None) > 0.0);
    }

    #[test]
    fn test_global_morans_negative_for_alternating() {
        let points = line(&[1.0, 5.0, 1.0, 5.0, 1.0, 5.0]);
        assert!(global_morans_i_points(&points, None) < 0.0);
    }

    #[test]
    fn test_global_morans_features_match_points() {
        let values = [2.0, 4.0, 1.0, 8.0];
        let features: Vec<Feature> = values
            .iter()
            .enumerate()
            .map(|(i, v)| feature(120.2 + i as f64 * 0.01, 23.0, *v))
            .collect();

        assert_relative_eq!(
            global_morans_i(&features, None),
            global_morans_i_points(&line(&values), None),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_global_morans_custom_weight() {
        let points = line(&[1.0, 2.0, 3.0, 4.0]);
        let zero = |_: &Coordinates, _: &Coordinates| 0.0;
        assert_eq!(global_morans_i_points(&points, Some(&zero)), 0.0);

        let equal = |_: &Coordinates, _: &Coordinates| 1.0;
        // Equal weights over all pairs: I = -1 / (n - 1)
        assert_relative_eq!(
            global_morans_i_points(&points, Some(&equal)),
            -1.0 / 3.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_feature_point_defaults() {
        let mut f = feature(120.2, 23.0, 1.0);
        f.properties = None;
        assert_eq!(feature_point(&f).unwrap().value, 0.0);

        f.geometry = None;
        assert!(feature_point(&f).is_none());
    }

    #[test]
    fn test_spatial_lag() {
        let points = line(&[10.0, 2.0, 4.0, 100.0]);

        // Equal weights over the two nearest neighbors of point 1
        assert_relative_eq!(spatial_lag(&points, 1, 2, WeightType::Equal), 7.0, epsilon = 1e-9);

        // Inverse distance favours the nearer neighbor
        let lag = spatial_lag(&points, 0, 2, WeightType::InverseDistance);
        assert!(lag > 2.0 && lag < 3.0);
    }

    #[test]
    fn test_spatial_lag_degenerate() {
        let points = line(&[1.0, 2.0]);
        assert_eq!(spatial_lag(&points, 5, 1, WeightType::Equal), 0.0);
        assert_eq!(spatial_lag(&points[..1], 0, 1, WeightType::Equal), 0.0);
    }

    #[test]
    fn test_local_morans_finite() {
        let points = line(&[1.0, 2.0, 8.0, 9.0, 3.0, 7.0]);
        let local = local_morans_i(&points, 2);

        assert_eq!(local.len(), points.len());
        assert!(local.iter().all(|l| l.local_morans_i.is_finite() && l.spatial_lag.is_finite()));
    }

    #[test]
    fn test_local_morans_zero_variance() {
        let points = line(&[4.0, 4.0, 4.0]);
        let local = local_morans_i(&points, 2);
        assert!(local.iter().all(|l| l.local_morans_i == 0.0));
        assert!(local_morans_i(&[], 2).is_empty());
    }

    #[test]
    fn test_local_morans_sign() {
        let points = line(&[1.0, 1.0, 1.0, 9.0, 9.0, 9.0]);
        let local = local_morans_i(&points, 1);

        // Point 0's nearest neighbor is point 1, also low
        assert!(local[0].standardized_value < 0.0);
        assert!(local[0].spatial_lag < 0.0);
        assert!(local[0].local_morans_i > 0.0);
    }

    #[test]
    fn test_detect_spatial_clusters() {
        let points = line(&[1.0, 1.0, 1.0, 9.0, 9.0, 9.0]);
        let clusters = detect_spatial_clusters(&points, 1, 0.1);

        assert_eq!(clusters.classifications.len(), 6);
        assert_eq!(clusters.classifications[0], ClusterType::LowLow);
        assert_eq!(clusters.classifications[5], ClusterType::HighHigh);
        assert!(clusters.low_low.contains(&0));
        assert!(clusters.high_high.contains(&5));
    }

    #[test]
    fn test_detect_spatial_clusters_outliers() {
        // A high value surrounded by low values
        let points = line(&[1.0, 1.0, 9.0, 1.0, 1.0]);
        let clusters = detect_spatial_clusters(&points, 2, 0.1);
        assert_eq!(clusters.classifications[2], ClusterType::HighLow);
    }

    #[test]
    fn test_detect_spatial_clusters_threshold() {
        let points = line(&[1.0, 1.0, 1.0, 9.0, 9.0, 9.0]);
        let clusters = detect_spatial_clusters(&points, 1, f64::MAX);
        assert_eq!(clusters.not_significant.len(), 6);
    }

    #[test]
    fn test_cluster_type_serialization() {
        assert_eq!(
            serde_json::to_string(&ClusterType::HighHigh).unwrap(),
            "\"high-high\""
        );
        assert_eq!(ClusterType::NotSignificant.to_string(), "not-significant");
    }
}
