//! Great-circle distance
//!
//! All distances are kilometers on a sphere of radius 6371 km.

use crate::constants::geo::EARTH_RADIUS_KM;
use crate::geometry::Coordinates;

/// Calculate the distance between two points in kilometers (Haversine formula)
///
/// # Arguments
/// * `lat1`, `lng1` - First point in degrees
/// * `lat2`, `lng2` - Second point in degrees
///
/// # Returns
/// Great-circle distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Haversine distance between two coordinate pairs in kilometers
pub fn distance_between(a: Coordinates, b: Coordinates) -> f64 {
    haversine_distance(a.lat, a.lng, b.lat, b.lng)
}

/// Distance from a point to a line segment in kilometers
///
/// The point is projected onto the segment in degree space, with the
/// projection parameter clamped to [0, 1], and the great-circle distance to
/// that projection is returned. A zero-length segment degrades to a plain
/// point-to-point distance.
pub fn point_to_line_distance(point: Coordinates, start: Coordinates, end: Coordinates) -> f64 {
    let dx = end.lng - start.lng;
    let dy = end.lat - start.lat;
    let length_squared = dx * dx + dy * dy;

    if length_squared == 0.0 {
        return distance_between(point, start);
    }

    let t = (((point.lng - start.lng) * dx + (point.lat - start.lat) * dy) / length_squared)
        .clamp(0.0, 1.0);
    let projection = Coordinates::new(start.lng + t * dx, start.lat + t * dy);

    distance_between(point, projection)
}
