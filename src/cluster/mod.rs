//! Clustering
//!
//! - K-means: partition clustering with great-circle assignment
//! - DBSCAN: density clustering with a noise label

pub mod dbscan;
pub mod kmeans;

pub use dbscan::{dbscan, DbscanSummary, NOISE};
pub use kmeans::{kmeans, ClusterMember, KMeansResult, DEFAULT_MAX_ITERATIONS};
