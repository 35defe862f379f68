//! Centralized constants for the care-atlas crate
//!
//! Constants shared by more than one analysis module live here so the
//! distance, area and projection math agree with each other.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in kilometers
    pub const EARTH_RADIUS_KM: f64 = 6371.0;

    /// Kilometers per degree of arc on the mean-radius sphere
    pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
}

/// Projected-TM grid parameters (GRS80, 121°E central meridian)
pub mod projection {
    /// Ellipsoid semi-major axis in meters
    pub const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

    /// Ellipsoid inverse flattening
    pub const INVERSE_FLATTENING: f64 = 298.257_222_101;

    /// Scale factor on the central meridian
    pub const SCALE_FACTOR: f64 = 0.9999;

    /// Central meridian in degrees east
    pub const CENTRAL_MERIDIAN: f64 = 121.0;

    /// False easting in meters
    pub const FALSE_EASTING: f64 = 250_000.0;

    /// False northing in meters
    pub const FALSE_NORTHING: f64 = 0.0;

    /// CRS identifier attached to projected output collections
    pub const PROJECTED_CRS_NAME: &str = "EPSG:3826";

    /// CRS identifier attached to geographic output collections
    pub const GEOGRAPHIC_CRS_NAME: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";
}

/// Statistical constants
pub mod stats {
    /// Two-tailed 95% critical z value
    pub const Z_CRITICAL_95: f64 = 1.96;

    /// Standard error coefficient of the Clark-Evans nearest neighbor test
    pub const NNI_STANDARD_ERROR_COEFF: f64 = 0.26136;

    /// K-means convergence threshold in kilometers
    pub const KMEANS_TOLERANCE_KM: f64 = 0.001;
}
