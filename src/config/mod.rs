//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/care-atlas/config.toml

pub mod defaults;

use crate::crs::{CoordinateTransformer, ProjectionParams, TransformMode};
use crate::error::{Error, Result};
use crate::weights::WeightType;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Defaults shared by several analyses
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// K-means and DBSCAN settings
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Local Moran's I settings
    #[serde(default)]
    pub autocorrelation: AutocorrelationConfig,

    /// Kernel density and IDW settings
    #[serde(default)]
    pub heatmap: HeatmapConfig,

    /// Projected grid definition
    #[serde(default)]
    pub projection: ProjectionConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default output format
    #[serde(default = "default_format")]
    pub format: String,

    /// Default neighbor count
    #[serde(default = "default_k")]
    pub k: usize,

    /// Default neighbor weighting
    #[serde(default)]
    pub weight_type: WeightType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_kmeans_k")]
    pub kmeans_k: usize,

    #[serde(default = "default_kmeans_max_iterations")]
    pub kmeans_max_iterations: usize,

    #[serde(default = "default_dbscan_eps_km")]
    pub dbscan_eps_km: f64,

    #[serde(default = "default_dbscan_min_pts")]
    pub dbscan_min_pts: usize,

    /// Seed for reproducible K-means initialization; unset uses thread RNG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutocorrelationConfig {
    #[serde(default = "default_cluster_threshold")]
    pub cluster_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapConfig {
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,

    #[serde(default = "default_radius_km")]
    pub radius_km: f64,

    #[serde(default = "default_idw_power")]
    pub idw_power: f64,
}

/// Transverse Mercator grid and transform failure mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default = "default_semi_major_axis")]
    pub semi_major_axis: f64,

    #[serde(default = "default_inverse_flattening")]
    pub inverse_flattening: f64,

    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    #[serde(default = "default_central_meridian")]
    pub central_meridian: f64,

    #[serde(default = "default_false_easting")]
    pub false_easting: f64,

    #[serde(default)]
    pub false_northing: f64,

    /// Reject out-of-region input instead of passing it through
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions for serde
fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}
fn default_k() -> usize {
    DEFAULT_K
}
fn default_kmeans_k() -> usize {
    DEFAULT_KMEANS_K
}
fn default_kmeans_max_iterations() -> usize {
    DEFAULT_KMEANS_MAX_ITERATIONS
}
fn default_dbscan_eps_km() -> f64 {
    DEFAULT_DBSCAN_EPS_KM
}
fn default_dbscan_min_pts() -> usize {
    DEFAULT_DBSCAN_MIN_PTS
}
fn default_cluster_threshold() -> f64 {
    DEFAULT_CLUSTER_THRESHOLD
}
fn default_grid_size() -> usize {
    DEFAULT_GRID_SIZE
}
fn default_radius_km() -> f64 {
    DEFAULT_RADIUS_KM
}
fn default_idw_power() -> f64 {
    DEFAULT_IDW_POWER
}
fn default_semi_major_axis() -> f64 {
    ProjectionParams::default().semi_major_axis
}
fn default_inverse_flattening() -> f64 {
    ProjectionParams::default().inverse_flattening
}
fn default_scale_factor() -> f64 {
    ProjectionParams::default().scale_factor
}
fn default_central_meridian() -> f64 {
    ProjectionParams::default().central_meridian
}
fn default_false_easting() -> f64 {
    ProjectionParams::default().false_easting
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            k: default_k(),
            weight_type: DEFAULT_WEIGHT_TYPE,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            kmeans_k: default_kmeans_k(),
            kmeans_max_iterations: default_kmeans_max_iterations(),
            dbscan_eps_km: default_dbscan_eps_km(),
            dbscan_min_pts: default_dbscan_min_pts(),
            seed: None,
        }
    }
}

impl Default for AutocorrelationConfig {
    fn default() -> Self {
        Self {
            cluster_threshold: default_cluster_threshold(),
        }
    }
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            radius_km: default_radius_km(),
            idw_power: default_idw_power(),
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        let params = ProjectionParams::default();
        Self {
            semi_major_axis: params.semi_major_axis,
            inverse_flattening: params.inverse_flattening,
            scale_factor: params.scale_factor,
            central_meridian: params.central_meridian,
            false_easting: params.false_easting,
            false_northing: params.false_northing,
            strict: false,
        }
    }
}

impl ProjectionConfig {
    /// Projection parameters described by this section
    pub fn params(&self) -> ProjectionParams {
        ProjectionParams {
            semi_major_axis: self.semi_major_axis,
            inverse_flattening: self.inverse_flattening,
            scale_factor: self.scale_factor,
            central_meridian: self.central_meridian,
            false_easting: self.false_easting,
            false_northing: self.false_northing,
        }
    }

    pub fn mode(&self) -> TransformMode {
        if self.strict {
            TransformMode::Strict
        } else {
            TransformMode::Lenient
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key". An unset seed reads as "none".
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["defaults", "format"] => Some(self.defaults.format.clone()),
            ["defaults", "k"] => Some(self.defaults.k.to_string()),
            ["defaults", "weight_type"] => Some(self.defaults.weight_type.to_string()),

            ["clustering", "kmeans_k"] => Some(self.clustering.kmeans_k.to_string()),
            ["clustering", "kmeans_max_iterations"] => {
                Some(self.clustering.kmeans_max_iterations.to_string())
            }
            ["clustering", "dbscan_eps_km"] => Some(self.clustering.dbscan_eps_km.to_string()),
            ["clustering", "dbscan_min_pts"] => Some(self.clustering.dbscan_min_pts.to_string()),
            ["clustering", "seed"] => Some(
                self.clustering
                    .seed
                    .map_or_else(|| "none".to_string(), |s| s.to_string()),
            ),

            ["autocorrelation", "cluster_threshold"] => {
                Some(self.autocorrelation.cluster_threshold.to_string())
            }

            ["heatmap", "grid_size"] => Some(self.heatmap.grid_size.to_string()),
            ["heatmap", "radius_km"] => Some(self.heatmap.radius_km.to_string()),
            ["heatmap", "idw_power"] => Some(self.heatmap.idw_power.to_string()),

            ["projection", "semi_major_axis"] => Some(self.projection.semi_major_axis.to_string()),
            ["projection", "inverse_flattening"] => {
                Some(self.projection.inverse_flattening.to_string())
            }
            ["projection", "scale_factor"] => Some(self.projection.scale_factor.to_string()),
            ["projection", "central_meridian"] => Some(self.projection.central_meridian.to_string()),
            ["projection", "false_easting"] => Some(self.projection.false_easting.to_string()),
            ["projection", "false_northing"] => Some(self.projection.false_northing.to_string()),
            ["projection", "strict"] => Some(self.projection.strict.to_string()),

            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key". Setting the seed to "none" clears it.
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["defaults", "format"] => {
                if crate::format::get_formatter(value).is_none() {
                    return Err(Error::Config(format!("Unknown format: {}", value)));
                }
                self.defaults.format = value.to_lowercase();
            }
            ["defaults", "k"] => self.defaults.k = parse_value(key, value)?,
            ["defaults", "weight_type"] => {
                self.defaults.weight_type = value.parse().map_err(Error::Config)?;
            }

            ["clustering", "kmeans_k"] => self.clustering.kmeans_k = parse_value(key, value)?,
            ["clustering", "kmeans_max_iterations"] => {
                self.clustering.kmeans_max_iterations = parse_value(key, value)?;
            }
            ["clustering", "dbscan_eps_km"] => {
                self.clustering.dbscan_eps_km = parse_value(key, value)?;
            }
            ["clustering", "dbscan_min_pts"] => {
                self.clustering.dbscan_min_pts = parse_value(key, value)?;
            }
            ["clustering", "seed"] => {
                self.clustering.seed = match value.to_lowercase().as_str() {
                    "" | "none" => None,
                    _ => Some(parse_value(key, value)?),
                };
            }

            ["autocorrelation", "cluster_threshold"] => {
                self.autocorrelation.cluster_threshold = parse_value(key, value)?;
            }

            ["heatmap", "grid_size"] => self.heatmap.grid_size = parse_value(key, value)?,
            ["heatmap", "radius_km"] => self.heatmap.radius_km = parse_value(key, value)?,
            ["heatmap", "idw_power"] => self.heatmap.idw_power = parse_value(key, value)?,

            ["projection", "semi_major_axis"] => {
                self.projection.semi_major_axis = parse_value(key, value)?;
            }
            ["projection", "inverse_flattening"] => {
                self.projection.inverse_flattening = parse_value(key, value)?;
            }
            ["projection", "scale_factor"] => {
                self.projection.scale_factor = parse_value(key, value)?;
            }
            ["projection", "central_meridian"] => {
                self.projection.central_meridian = parse_value(key, value)?;
            }
            ["projection", "false_easting"] => {
                self.projection.false_easting = parse_value(key, value)?;
            }
            ["projection", "false_northing"] => {
                self.projection.false_northing = parse_value(key, value)?;
            }
            ["projection", "strict"] => self.projection.strict = parse_value(key, value)?,

            ["server", "host"] => self.server.host = value.to_string(),
            ["server", "port"] => self.server.port = parse_value(key, value)?,

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "defaults.format",
            "defaults.k",
            "defaults.weight_type",
            "clustering.kmeans_k",
            "clustering.kmeans_max_iterations",
            "clustering.dbscan_eps_km",
            "clustering.dbscan_min_pts",
            "clustering.seed",
            "autocorrelation.cluster_threshold",
            "heatmap.grid_size",
            "heatmap.radius_km",
            "heatmap.idw_power",
            "projection.semi_major_axis",
            "projection.inverse_flattening",
            "projection.scale_factor",
            "projection.central_meridian",
            "projection.false_easting",
            "projection.false_northing",
            "projection.strict",
            "server.host",
            "server.port",
        ]
    }

    /// Transformer for the configured grid and failure mode
    pub fn transformer(&self) -> CoordinateTransformer {
        CoordinateTransformer::new(self.projection.params()).with_mode(self.projection.mode())
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
