//! Geometric primitives
//!
//! This module handles:
//! - Great-circle distances (point-to-point and point-to-segment)
//! - Polygon area, perimeter and containment
//! - Centroids and bounding boxes
//! - Circular buffer rings

pub mod buffer;
pub mod distance;
pub mod polygon;

pub use buffer::{create_point_buffer, DEFAULT_BUFFER_SEGMENTS};
pub use distance::{distance_between, haversine_distance, point_to_line_distance};
pub use polygon::{bounds, centroid, geometry_centroid, point_in_polygon, polygon_area, polygon_perimeter};

use serde::{Deserialize, Serialize};

/// A coordinate pair
///
/// For geographic data `lng`/`lat` are degrees. For projected data the same
/// fields carry easting/northing in meters; the coordinate system is always
/// tracked by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinates {
    /// Create new coordinates in (x, y) order
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Build coordinates from a GeoJSON position (`[x, y, ...]`)
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [x, y, ..] => Some(Self::new(*x, *y)),
            _ => None,
        }
    }

    /// Validate that coordinates are within geographic ranges
    ///
    /// Longitude: -180 to 180
    /// Latitude: -90 to 90
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.lng.is_finite() || !self.lat.is_finite() {
            return Err(crate::error::Error::InvalidCoordinates(format!(
                "({}, {}) is not finite",
                self.lng, self.lat
            )));
        }
        if self.lat < -90.0 || self.lat > 90.0 {
            return Err(crate::error::Error::InvalidCoordinates(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if self.lng < -180.0 || self.lng > 180.0 {
            return Err(crate::error::Error::InvalidCoordinates(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

/// A point carrying a numeric attribute
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedPoint {
    pub lng: f64,
    pub lat: f64,
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl WeightedPoint {
    /// Create a weighted point without an explicit weight
    pub fn new(lng: f64, lat: f64, value: f64) -> Self {
        Self {
            lng,
            lat,
            value,
            weight: None,
        }
    }

    /// Set the point weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// The coordinate part of this point
    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lng, self.lat)
    }
}

impl From<Coordinates> for WeightedPoint {
    fn from(coords: Coordinates) -> Self {
        Self::new(coords.lng, coords.lat, 0.0)
    }
}

/// Axis-aligned bounding box in (lng, lat)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// Width in degrees of longitude
    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    /// Height in degrees of latitude
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}
