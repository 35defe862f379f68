//! Circular buffer generation
//!
//! Approximates a circle around a point as a closed polygon ring using a
//! local equirectangular approximation.

use crate::constants::geo::EARTH_RADIUS_KM;
use crate::geometry::Coordinates;
use std::f64::consts::PI;

/// Default number of ring segments
pub const DEFAULT_BUFFER_SEGMENTS: usize = 32;

/// Build a closed ring approximating a circle of `radius_km` around `center`
///
/// # Arguments
/// * `center` - Circle center in degrees
/// * `radius_km` - Radius in kilometers
/// * `segments` - Number of distinct vertices
///
/// # Returns
/// `segments + 1` coordinates; the first vertex is repeated at the end.
/// Zero segments yields an empty ring.
pub fn create_point_buffer(center: Coordinates, radius_km: f64, segments: usize) -> Vec<Coordinates> {
    if segments == 0 {
        return Vec::new();
    }

    let angular_radius = (radius_km / EARTH_RADIUS_KM).to_degrees();
    let cos_lat = center.lat.to_radians().cos();

    let mut ring: Vec<Coordinates> = (0..segments)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / segments as f64;
            let delta_lat = angular_radius * theta.cos();
            let delta_lng = angular_radius * theta.sin() / cos_lat;
            Coordinates::new(center.lng + delta_lng, center.lat + delta_lat)
        })
        .collect();

    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    ring
}
