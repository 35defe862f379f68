//! Default configuration values
//!
//! Named constants for every tunable analysis parameter

use crate::weights::WeightType;

/// Default output format
pub const DEFAULT_FORMAT: &str = "json";

/// Default neighbor count for knn, weights and local statistics
pub const DEFAULT_K: usize = 5;

/// Default neighbor weighting
pub const DEFAULT_WEIGHT_TYPE: WeightType = WeightType::InverseDistance;

/// Default K-means iteration cap
pub const DEFAULT_KMEANS_MAX_ITERATIONS: usize = crate::cluster::DEFAULT_MAX_ITERATIONS;

/// Default K-means cluster count
pub const DEFAULT_KMEANS_K: usize = 3;

/// Default DBSCAN neighborhood radius in kilometers
pub const DEFAULT_DBSCAN_EPS_KM: f64 = 1.0;

/// Default DBSCAN core point threshold
pub const DEFAULT_DBSCAN_MIN_PTS: usize = 3;

/// Minimum |local Moran's I| for a point to count as clustered
pub const DEFAULT_CLUSTER_THRESHOLD: f64 = 0.1;

/// Default heatmap cells per side
pub const DEFAULT_GRID_SIZE: usize = 50;

/// Largest accepted heatmap grid size (cells per side)
pub const MAX_GRID_SIZE: usize = 1_000;

/// Default kernel search radius in kilometers
pub const DEFAULT_RADIUS_KM: f64 = 1.0;

/// Default IDW distance exponent
pub const DEFAULT_IDW_POWER: f64 = crate::heatmap::DEFAULT_IDW_POWER;

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 7979;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "care-atlas";
