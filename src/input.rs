//! Input loading
//!
//! Reads point sets and feature collections from JSON files. Accepted
//! shapes:
//! - a GeoJSON FeatureCollection (points at feature centroids, numeric
//!   `value` property)
//! - an array of `[x, y]` pairs
//! - an array of `{lng, lat, value?, weight?}` objects
//!
//! Point sets in the projected grid are converted to geographic degrees.

use crate::autocorrelation::feature_point;
use crate::crs::{self, CoordinateSystem, CoordinateTransformer, TransformMode};
use crate::error::{Error, Result};
use crate::geometry::{Coordinates, WeightedPoint};
use geojson::{FeatureCollection, GeoJson};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read and parse a JSON file
pub fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Parse a GeoJSON FeatureCollection
pub fn parse_collection(value: Value) -> Result<FeatureCollection> {
    match GeoJson::from_json_value(value)? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        _ => Err(Error::InvalidParameter("Expected a GeoJSON FeatureCollection".to_string())),
    }
}

/// Load a FeatureCollection from a file
pub fn load_collection(path: &Path) -> Result<FeatureCollection> {
    parse_collection(read_json(path)?)
}

fn pair_point(pair: &[Value]) -> Option<WeightedPoint> {
    match pair {
        [x, y, ..] => Some(WeightedPoint::new(x.as_f64()?, y.as_f64()?, 0.0)),
        _ => None,
    }
}

/// Parse any accepted input shape into points, coordinates as given
pub fn parse_points(value: Value) -> Result<Vec<WeightedPoint>> {
    let is_collection = value.get("type").and_then(Value::as_str) == Some("FeatureCollection");
    if is_collection {
        let collection = parse_collection(value)?;
        return Ok(collection.features.iter().filter_map(feature_point).collect());
    }

    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Array(pair) => pair_point(&pair)
                    .ok_or_else(|| Error::InvalidParameter(format!("Point {} is not an [x, y] pair", i))),
                other => serde_json::from_value(other).map_err(Error::from),
            })
            .collect(),
        _ => Err(Error::InvalidParameter(
            "Expected a FeatureCollection or an array of points".to_string(),
        )),
    }
}

/// Convert projected points to geographic degrees
///
/// The coordinate system is detected from the first point. Geographic or
/// unrecognized input is returned unchanged. In strict mode a point
/// outside the projected grid is an error.
pub fn normalize_points(points: Vec<WeightedPoint>, transformer: &CoordinateTransformer) -> Result<Vec<WeightedPoint>> {
    let Some(first) = points.first() else {
        return Ok(points);
    };
    if crs::detect(first.lng, first.lat) != CoordinateSystem::Projected {
        return Ok(points);
    }

    debug!("Converting {} projected points to geographic", points.len());

    points
        .into_iter()
        .map(|p| {
            let Coordinates { lng, lat } = match transformer.mode() {
                TransformMode::Strict => transformer.try_projected_to_geographic(p.lng, p.lat)?,
                TransformMode::Lenient => transformer.projected_to_geographic(p.lng, p.lat),
            };
            Ok(WeightedPoint { lng, lat, ..p })
        })
        .collect()
}

/// Load points from a file, normalized to geographic degrees
pub fn load_points(path: &Path, transformer: &CoordinateTransformer) -> Result<Vec<WeightedPoint>> {
    let value = read_json(path)?;

    let points = match value {
        Value::Object(_) => {
            // Collections carry their own CRS hints
            let collection = parse_collection(value)?;
            let geographic = transformer.transform_feature_collection(&collection, None, CoordinateSystem::Geographic)?;
            geographic.features.iter().filter_map(feature_point).collect()
        }
        other => normalize_points(parse_points(other)?, transformer)?,
    };

    debug!("Loaded {} points from {}", points.len(), path.display());
    Ok(points)
}
