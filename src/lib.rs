//! care-atlas: spatial analysis for care facility maps
//!
//! A library and CLI tool for the geospatial statistics behind a city map of
//! long-term-care and healthcare facilities.
//!
//! ## Features
//!
//! - Transverse Mercator reprojection between the regional projected grid
//!   and longitude/latitude, with coordinate system detection
//! - Great-circle distance, area, perimeter, centroid and buffer primitives
//! - k-nearest-neighbor weights, K-means and DBSCAN clustering
//! - Global and local Moran's I, LISA clusters, nearest neighbor index
//! - Kernel density grids and IDW interpolation
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use care_atlas::autocorrelation::nearest_neighbor_index;
//! use care_atlas::crs::CoordinateTransformer;
//! use care_atlas::geometry::WeightedPoint;
//!
//! let transformer = CoordinateTransformer::default();
//! let clinic = transformer.projected_to_geographic(250_000.0, 2_599_651.349);
//! assert!((clinic.lng - 121.0).abs() < 1e-6);
//!
//! let points = vec![
//!     WeightedPoint::new(120.20, 23.00, 3.0),
//!     WeightedPoint::new(120.21, 23.00, 5.0),
//!     WeightedPoint::new(120.20, 23.01, 4.0),
//! ];
//! let nni = nearest_neighbor_index(&points);
//! println!("Pattern: {}", nni.interpretation);
//! ```

pub mod analysis;
pub mod autocorrelation;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod crs;
pub mod error;
pub mod format;
pub mod geometry;
pub mod heatmap;
pub mod input;
pub mod random;
pub mod server;
pub mod weights;

// Re-export commonly used types
pub use analysis::{Analysis, AnalysisRequest, AnalysisResponse, AnalysisResult};
pub use config::Config;
pub use crs::{CoordinateSystem, CoordinateTransformer};
pub use error::{Error, Result};
pub use geometry::{Bounds, Coordinates, WeightedPoint};
