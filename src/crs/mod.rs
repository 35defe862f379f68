//! Coordinate reference systems
//!
//! This module handles:
//! - Range-based detection of projected vs geographic coordinates
//! - The Projected-TM transverse Mercator projection
//! - Recursive reprojection of GeoJSON geometries and feature collections

pub mod projection;
pub mod transform;

pub use projection::{ProjectionParams, TransverseMercator};
pub use transform::{CoordinateTransformer, TransformMode};

use serde::{Deserialize, Serialize};

/// Projected grid extent of the region of interest (meters)
const PROJECTED_X_RANGE: (f64, f64) = (100_000.0, 400_000.0);
const PROJECTED_Y_RANGE: (f64, f64) = (2_400_000.0, 2_800_000.0);

/// Geographic extent of the region of interest (degrees)
const GEOGRAPHIC_LNG_RANGE: (f64, f64) = (119.0, 122.0);
const GEOGRAPHIC_LAT_RANGE: (f64, f64) = (21.5, 25.5);

/// Magnitude above which an unmatched ordinate is taken to be meters
const PROJECTED_MAGNITUDE: f64 = 10_000.0;

/// Coordinate reference system label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// Projected-TM grid, meters
    Projected,
    /// Longitude/latitude, degrees
    #[default]
    Geographic,
    /// Could not be determined
    Unknown,
}

impl std::fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Projected => write!(f, "projected"),
            Self::Geographic => write!(f, "geographic"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for CoordinateSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "projected" | "twd97" | "epsg:3826" | "3826" => Ok(Self::Projected),
            "geographic" | "wgs84" | "epsg:4326" | "4326" | "crs84" => Ok(Self::Geographic),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown coordinate system: {}", s)),
        }
    }
}

impl CoordinateSystem {
    /// Classify a CRS identifier string such as `EPSG:3826` or
    /// `urn:ogc:def:crs:OGC:1.3:CRS84`
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let id = identifier.to_lowercase();
        if id.contains("3826") || id.contains("twd97") {
            Some(Self::Projected)
        } else if id.contains("4326") || id.contains("crs84") || id.contains("wgs84") {
            Some(Self::Geographic)
        } else {
            None
        }
    }
}

fn within(value: f64, (min, max): (f64, f64)) -> bool {
    value >= min && value <= max
}

/// True if (x, y) lies in the projected grid extent of the region
pub fn in_projected_region(x: f64, y: f64) -> bool {
    within(x, PROJECTED_X_RANGE) && within(y, PROJECTED_Y_RANGE)
}

/// True if (lng, lat) lies in the geographic extent of the region
pub fn in_geographic_region(lng: f64, lat: f64) -> bool {
    within(lng, GEOGRAPHIC_LNG_RANGE) && within(lat, GEOGRAPHIC_LAT_RANGE)
}

/// Detect the coordinate system of a single coordinate pair
///
/// Strict regional ranges are checked first. Outside them, any ordinate with
/// magnitude above 10000 means meters, and values within ±180/±90 mean
/// degrees. Anything else is `Unknown`.
pub fn detect(x: f64, y: f64) -> CoordinateSystem {
    if !x.is_finite() || !y.is_finite() {
        return CoordinateSystem::Unknown;
    }

    if in_projected_region(x, y) {
        CoordinateSystem::Projected
    } else if in_geographic_region(x, y) {
        CoordinateSystem::Geographic
    } else if x.abs() > PROJECTED_MAGNITUDE || y.abs() > PROJECTED_MAGNITUDE {
        CoordinateSystem::Projected
    } else if x.abs() <= 180.0 && y.abs() <= 90.0 {
        CoordinateSystem::Geographic
    } else {
        CoordinateSystem::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_detect_reference_points() {
        assert_eq!(detect(165_295.0, 2_540_755.07), CoordinateSystem::Projected);
        assert_eq!(detect(120.20, 22.99), CoordinateSystem::Geographic);
    }

    #[test]
    fn test_detect_relaxed_fallback() {
        // Meters outside the regional grid
        assert_eq!(detect(500_000.0, 4_000_000.0), CoordinateSystem::Projected);
        // Degrees outside the region of interest
        assert_eq!(detect(-74.006, 40.7128), CoordinateSystem::Geographic);
        // Neither plausible degrees nor large enough to be meters
        assert_eq!(detect(500.0, 20.0), CoordinateSystem::Unknown);
        assert_eq!(detect(f64::NAN, 20.0), CoordinateSystem::Unknown);
    }

    #[test]
    fn test_detect_idempotent() {
        for (x, y) in [(165_295.0, 2_540_755.07), (120.2, 22.99), (500.0, 20.0)] {
            assert_eq!(detect(x, y), detect(x, y));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            CoordinateSystem::from_str("EPSG:3826").unwrap(),
            CoordinateSystem::Projected
        );
        assert_eq!(
            CoordinateSystem::from_str("geographic").unwrap(),
            CoordinateSystem::Geographic
        );
        assert!(CoordinateSystem::from_str("mercator").is_err());
    }

    #[test]
    fn test_from_identifier() {
        assert_eq!(
            CoordinateSystem::from_identifier("urn:ogc:def:crs:EPSG::3826"),
            Some(CoordinateSystem::Projected)
        );
        assert_eq!(
            CoordinateSystem::from_identifier("urn:ogc:def:crs:OGC:1.3:CRS84"),
            Some(CoordinateSystem::Geographic)
        );
        assert_eq!(CoordinateSystem::from_identifier("EPSG:3857"), None);
    }

    #[test]
    fn test_default_is_geographic() {
        assert_eq!(CoordinateSystem::default(), CoordinateSystem::Geographic);
    }

    #[test]
    fn test_display_roundtrip() {
        for crs in [
            CoordinateSystem::Projected,
            CoordinateSystem::Geographic,
            CoordinateSystem::Unknown,
        ] {
            assert_eq!(CoordinateSystem::from_str(&crs.to_string()).unwrap(), crs);
        }
    }
}
