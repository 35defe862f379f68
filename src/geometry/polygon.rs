//! Polygon measures, containment, centroids and bounds
//!
//! Rings are ordered sequences of (lng, lat) coordinates. A ring may or may
//! not repeat its first vertex at the end; every routine here treats it as
//! closed either way.

use crate::constants::geo::EARTH_RADIUS_KM;
use crate::geometry::distance::distance_between;
use crate::geometry::{Bounds, Coordinates};

/// Even-odd ray casting test
///
/// Self-intersecting rings are not validated; the result for them follows
/// the even-odd rule without further meaning.
pub fn point_in_polygon(point: Coordinates, ring: &[Coordinates]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].lng, ring[i].lat);
        let (xj, yj) = (ring[j].lng, ring[j].lat);

        let crosses = (yi > point.lat) != (yj > point.lat)
            && point.lng < (xj - xi) * (point.lat - yi) / (yj - yi) + xi;
        if crosses {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Approximate area of a ring on the sphere in square kilometers
///
/// Uses the spherical excess approximation
/// `|Σ (λ₂ - λ₁)(2 + sin φ₁ + sin φ₂)| · R² / 2`.
/// Rings with fewer than 3 vertices have zero area.
pub fn polygon_area(ring: &[Coordinates]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }

    let mut total = 0.0;
    for i in 0..n {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % n];
        total += (p2.lng - p1.lng).to_radians()
            * (2.0 + p1.lat.to_radians().sin() + p2.lat.to_radians().sin());
    }

    (total * EARTH_RADIUS_KM * EARTH_RADIUS_KM / 2.0).abs()
}

/// Perimeter of a ring in kilometers, wrapping from the last vertex to the first
pub fn polygon_perimeter(ring: &[Coordinates]) -> f64 {
    let n = ring.len();
    if n < 2 {
        return 0.0;
    }

    (0..n)
        .map(|i| distance_between(ring[i], ring[(i + 1) % n]))
        .sum()
}

/// Arithmetic mean of a point set; (0, 0) for empty input
pub fn centroid(points: &[Coordinates]) -> Coordinates {
    if points.is_empty() {
        return Coordinates::new(0.0, 0.0);
    }

    let n = points.len() as f64;
    let (sum_lng, sum_lat) = points
        .iter()
        .fold((0.0, 0.0), |(x, y), p| (x + p.lng, y + p.lat));

    Coordinates::new(sum_lng / n, sum_lat / n)
}

/// Axis-aligned extent of a point set; all zeros for empty input
pub fn bounds(points: &[Coordinates]) -> Bounds {
    let Some(first) = points.first() else {
        return Bounds::default();
    };

    points.iter().skip(1).fold(
        Bounds {
            min_lng: first.lng,
            min_lat: first.lat,
            max_lng: first.lng,
            max_lat: first.lat,
        },
        |b, p| Bounds {
            min_lng: b.min_lng.min(p.lng),
            min_lat: b.min_lat.min(p.lat),
            max_lng: b.max_lng.max(p.lng),
            max_lat: b.max_lat.max(p.lat),
        },
    )
}

/// Mean of every position in a GeoJSON geometry
///
/// Returns `None` when the geometry holds no usable position.
pub fn geometry_centroid(value: &geojson::Value) -> Option<Coordinates> {
    let mut positions = Vec::new();
    collect_positions(value, &mut positions);

    if positions.is_empty() {
        None
    } else {
        Some(centroid(&positions))
    }
}

fn collect_positions(value: &geojson::Value, out: &mut Vec<Coordinates>) {
    use geojson::Value;

    let positions: Vec<&Vec<f64>> = match value {
        Value::Point(p) => vec![p],
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().collect(),
        Value::MultiLineString(rings) | Value::Polygon(rings) => rings.iter().flatten().collect(),
        Value::MultiPolygon(polygons) => polygons.iter().flatten().flatten().collect(),
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_positions(&geometry.value, out);
            }
            Vec::new()
        }
    };

    out.extend(positions.into_iter().filter_map(|p| Coordinates::from_position(p)));
}
