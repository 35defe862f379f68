//! Error types for care-atlas

use thiserror::Error;

/// Main error type for care-atlas operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Random source error: {0}")]
    Random(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for care-atlas operations
pub type Result<T> = std::result::Result<T, Error>;
