//! Analysis dispatch
//!
//! This module handles:
//! - The serde-tagged [`Analysis`] enum naming one analysis and its parameters
//! - Filling unset parameters from [`Config`]
//! - Validating parameters and running the analysis over a point set
//! - Wrapping the outcome in an [`AnalysisResponse`] with id and metadata

use crate::autocorrelation::{
    detect_spatial_clusters, global_morans_i_points, local_morans_i, nearest_neighbor_index, LocalMoran,
    NearestNeighborIndex, SpatialClusters,
};
use crate::cluster::{dbscan, kmeans, DbscanSummary, KMeansResult};
use crate::config::{defaults::MAX_GRID_SIZE, Config};
use crate::error::{Error, Result};
use crate::geometry::{bounds, Bounds, Coordinates, WeightedPoint};
use crate::heatmap::{inverse_distance_weighting, kernel_density_grid, HeatCell};
use crate::random::{get_source, RandomSource};
use crate::weights::{try_k_nearest_neighbors, weight_matrix, NeighborRecord, WeightType};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One analysis and its parameters; unset parameters come from config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Analysis {
    /// k nearest neighbors of one point
    Knn {
        index: usize,
        #[serde(default)]
        k: Option<usize>,
    },
    /// Row-wise k-neighbor weight matrix
    Weights {
        #[serde(default)]
        k: Option<usize>,
        #[serde(default)]
        weight_type: Option<WeightType>,
    },
    Kmeans {
        #[serde(default)]
        k: Option<usize>,
        #[serde(default)]
        max_iterations: Option<usize>,
        #[serde(default)]
        seed: Option<u64>,
    },
    Dbscan {
        #[serde(default)]
        eps_km: Option<f64>,
        #[serde(default)]
        min_pts: Option<usize>,
    },
    /// Global Moran's I with inverse distance weights
    Morans,
    /// Local Moran's I per point
    Lisa {
        #[serde(default)]
        k: Option<usize>,
    },
    /// LISA quadrant classification
    Clusters {
        #[serde(default)]
        k: Option<usize>,
        #[serde(default)]
        threshold: Option<f64>,
    },
    /// Nearest neighbor index
    Nni,
    Heatmap {
        #[serde(default)]
        grid_size: Option<usize>,
        #[serde(default)]
        radius_km: Option<f64>,
        /// Grid extent; the bounding box of the points when unset
        #[serde(default)]
        bounds: Option<Bounds>,
    },
    /// IDW interpolation at one location
    Idw {
        target: Coordinates,
        #[serde(default)]
        power: Option<f64>,
    },
}

impl Analysis {
    /// Short name used in reports and the CLI
    pub fn name(&self) -> &'static str {
        match self {
            Self::Knn { .. } => "knn",
            Self::Weights { .. } => "weights",
            Self::Kmeans { .. } => "kmeans",
            Self::Dbscan { .. } => "dbscan",
            Self::Morans => "morans",
            Self::Lisa { .. } => "lisa",
            Self::Clusters { .. } => "clusters",
            Self::Nni => "nni",
            Self::Heatmap { .. } => "heatmap",
            Self::Idw { .. } => "idw",
        }
    }

    /// Copy with every unset parameter filled from `config`
    ///
    /// The heatmap extent stays unset; it depends on the points.
    pub fn with_defaults(&self, config: &Config) -> Self {
        let k = |k: &Option<usize>| Some(k.unwrap_or(config.defaults.k));

        match self {
            Self::Knn { index, k: n } => Self::Knn {
                index: *index,
                k: k(n),
            },
            Self::Weights { k: n, weight_type } => Self::Weights {
                k: k(n),
                weight_type: Some(weight_type.unwrap_or(config.defaults.weight_type)),
            },
            Self::Kmeans {
                k,
                max_iterations,
                seed,
            } => Self::Kmeans {
                k: Some(k.unwrap_or(config.clustering.kmeans_k)),
                max_iterations: Some(max_iterations.unwrap_or(config.clustering.kmeans_max_iterations)),
                seed: seed.or(config.clustering.seed),
            },
            Self::Dbscan { eps_km, min_pts } => Self::Dbscan {
                eps_km: Some(eps_km.unwrap_or(config.clustering.dbscan_eps_km)),
                min_pts: Some(min_pts.unwrap_or(config.clustering.dbscan_min_pts)),
            },
            Self::Morans => Self::Morans,
            Self::Lisa { k: n } => Self::Lisa { k: k(n) },
            Self::Clusters { k: n, threshold } => Self::Clusters {
                k: k(n),
                threshold: Some(threshold.unwrap_or(config.autocorrelation.cluster_threshold)),
            },
            Self::Nni => Self::Nni,
            Self::Heatmap {
                grid_size,
                radius_km,
                bounds,
            } => Self::Heatmap {
                grid_size: Some(grid_size.unwrap_or(config.heatmap.grid_size)),
                radius_km: Some(radius_km.unwrap_or(config.heatmap.radius_km)),
                bounds: *bounds,
            },
            Self::Idw { target, power } => Self::Idw {
                target: *target,
                power: Some(power.unwrap_or(config.heatmap.idw_power)),
            },
        }
    }
}

impl std::fmt::Display for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Points plus the analysis to run over them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub points: Vec<WeightedPoint>,
    pub analysis: Analysis,
}

/// Outcome of an analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisResult {
    Knn { neighbors: Vec<NeighborRecord> },
    Weights { matrix: Vec<Vec<f64>> },
    Kmeans(KMeansResult),
    Dbscan { labels: Vec<i64>, summary: DbscanSummary },
    Morans { morans_i: f64 },
    Lisa { local: Vec<LocalMoran> },
    Clusters(SpatialClusters),
    Nni(NearestNeighborIndex),
    Heatmap { cells: Vec<HeatCell> },
    Idw { value: f64 },
}

/// Full analysis response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Unique ID for this run
    pub id: String,

    /// Analysis with every parameter resolved
    pub analysis: Analysis,

    pub result: AnalysisResult,

    pub metadata: AnalysisMetadata,
}

/// Metadata about the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// When the analysis ran (RFC 3339, UTC)
    pub timestamp: String,
    /// Number of input points
    pub point_count: usize,
    /// Random source used, for analyses that draw random numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_source: Option<String>,
}

fn require_positive_count(name: &str, value: usize) -> Result<usize> {
    if value == 0 {
        return Err(Error::InvalidParameter(format!("{} must be greater than 0", name)));
    }
    Ok(value)
}

fn require_at_most(name: &str, value: usize, max: usize) -> Result<usize> {
    if value > max {
        return Err(Error::InvalidParameter(format!("{} must be at most {}", name, max)));
    }
    Ok(value)
}

fn require_positive(name: &str, value: f64) -> Result<f64> {
    if !(value.is_finite() && value > 0.0) {
        return Err(Error::InvalidParameter(format!("{} must be a positive number", name)));
    }
    Ok(value)
}

/// Run an analysis, drawing randomness from a source chosen by the
/// resolved seed
pub fn run(request: &AnalysisRequest, config: &Config) -> Result<AnalysisResponse> {
    let analysis = request.analysis.with_defaults(config);
    let seed = match analysis {
        Analysis::Kmeans { seed, .. } => seed,
        _ => None,
    };
    let rng = get_source(seed);
    run_with_source(&request.points, &analysis, config, rng.as_ref())
}

/// Run an analysis with an explicit random source
///
/// # Arguments
/// * `points` - Input points, geographic degrees
/// * `analysis` - Analysis to run; unset parameters come from `config`
/// * `config` - Application config
/// * `rng` - Random source for K-means initialization
///
/// # Returns
/// The response, or `InvalidParameter` for empty input or out-of-range
/// parameters
pub fn run_with_source(
    points: &[WeightedPoint],
    analysis: &Analysis,
    config: &Config,
    rng: &dyn RandomSource,
) -> Result<AnalysisResponse> {
    if points.is_empty() {
        return Err(Error::InvalidParameter("At least one point is required".to_string()));
    }
    for point in points {
        point.coords().validate()?;
    }

    let analysis = analysis.with_defaults(config);
    let mut random_source = None;

    let result = match &analysis {
        Analysis::Knn { index, k } => {
            let k = require_positive_count("k", k.unwrap_or(config.defaults.k))?;
            AnalysisResult::Knn {
                neighbors: try_k_nearest_neighbors(points, *index, k)?,
            }
        }
        Analysis::Weights { k, weight_type } => {
            let k = require_positive_count("k", k.unwrap_or(config.defaults.k))?;
            AnalysisResult::Weights {
                matrix: weight_matrix(points, k, weight_type.unwrap_or(config.defaults.weight_type)),
            }
        }
        Analysis::Kmeans { k, max_iterations, .. } => {
            let k = require_positive_count("k", k.unwrap_or(config.clustering.kmeans_k))?;
            let k = require_at_most("k", k, points.len())?;
            let coords: Vec<Coordinates> = points.iter().map(WeightedPoint::coords).collect();
            random_source = Some(rng.name().to_string());
            AnalysisResult::Kmeans(kmeans(
                &coords,
                k,
                max_iterations.unwrap_or(config.clustering.kmeans_max_iterations),
                rng,
            )?)
        }
        Analysis::Dbscan { eps_km, min_pts } => {
            let eps = require_positive("eps_km", eps_km.unwrap_or(config.clustering.dbscan_eps_km))?;
            let min_pts = require_positive_count("min_pts", min_pts.unwrap_or(config.clustering.dbscan_min_pts))?;
            let coords: Vec<Coordinates> = points.iter().map(WeightedPoint::coords).collect();
            let labels = dbscan(&coords, eps, min_pts);
            let summary = DbscanSummary::from_labels(&labels);
            AnalysisResult::Dbscan { labels, summary }
        }
        Analysis::Morans => AnalysisResult::Morans {
            morans_i: global_morans_i_points(points, None),
        },
        Analysis::Lisa { k } => {
            let k = require_positive_count("k", k.unwrap_or(config.defaults.k))?;
            AnalysisResult::Lisa {
                local: local_morans_i(points, k),
            }
        }
        Analysis::Clusters { k, threshold } => {
            let k = require_positive_count("k", k.unwrap_or(config.defaults.k))?;
            let threshold = threshold.unwrap_or(config.autocorrelation.cluster_threshold);
            AnalysisResult::Clusters(detect_spatial_clusters(points, k, threshold))
        }
        Analysis::Nni => AnalysisResult::Nni(nearest_neighbor_index(points)),
        Analysis::Heatmap {
            grid_size,
            radius_km,
            bounds: extent,
        } => {
            let grid_size = require_positive_count("grid_size", grid_size.unwrap_or(config.heatmap.grid_size))?;
            let grid_size = require_at_most("grid_size", grid_size, MAX_GRID_SIZE)?;
            let radius = require_positive("radius_km", radius_km.unwrap_or(config.heatmap.radius_km))?;
            let extent = extent.unwrap_or_else(|| {
                let coords: Vec<Coordinates> = points.iter().map(WeightedPoint::coords).collect();
                bounds(&coords)
            });
            AnalysisResult::Heatmap {
                cells: kernel_density_grid(points, &extent, grid_size, radius),
            }
        }
        Analysis::Idw { target, power } => {
            target.validate()?;
            let power = require_positive("power", power.unwrap_or(config.heatmap.idw_power))?;
            AnalysisResult::Idw {
                value: inverse_distance_weighting(points, *target, power),
            }
        }
    };

    debug!("Ran {} on {} points", analysis.name(), points.len());

    Ok(AnalysisResponse {
        id: uuid::Uuid::new_v4().to_string(),
        analysis,
        result,
        metadata: AnalysisMetadata {
            timestamp: chrono::Utc::now().to_rfc3339(),
            point_count: points.len(),
            random_source,
        },
    })
}
