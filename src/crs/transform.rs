//! CRS transformation of points, geometries and feature collections
//!
//! A `CoordinateTransformer` is built once from explicit projection
//! parameters and passed to whoever needs it. In lenient mode (the default)
//! a failing point transform is logged and the input pair is returned
//! unchanged; in strict mode the failure is returned to the caller.

use crate::constants::projection::{GEOGRAPHIC_CRS_NAME, PROJECTED_CRS_NAME};
use crate::crs::projection::{ProjectionParams, TransverseMercator};
use crate::crs::{detect, in_geographic_region, in_projected_region, CoordinateSystem};
use crate::error::{Error, Result};
use crate::geometry::Coordinates;
use geojson::{Feature, FeatureCollection, JsonObject, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

/// Property / foreign member key carrying transform provenance
pub const TRANSFORM_KEY: &str = "_transform";

/// How transform failures are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    /// Log and return the original coordinates
    #[default]
    Lenient,
    /// Return an error
    Strict,
}

/// Converts coordinates between the projected grid and geographic degrees
#[derive(Debug, Clone, Default)]
pub struct CoordinateTransformer {
    projection: TransverseMercator,
    mode: TransformMode,
}

impl CoordinateTransformer {
    /// Create a lenient transformer for the given projection
    pub fn new(params: ProjectionParams) -> Self {
        Self {
            projection: TransverseMercator::new(params),
            mode: TransformMode::Lenient,
        }
    }

    /// Set the failure mode
    pub fn with_mode(mut self, mode: TransformMode) -> Self {
        self.mode = mode;
        self
    }

    /// Current failure mode
    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    /// Projection parameters in use
    pub fn params(&self) -> &ProjectionParams {
        self.projection.params()
    }

    /// Convert projected (x, y) meters to geographic degrees
    ///
    /// Input outside the regional grid only produces a warning. If the
    /// conversion fails the input pair is returned unchanged.
    pub fn projected_to_geographic(&self, x: f64, y: f64) -> Coordinates {
        match self.inverse_checked(x, y, false) {
            Ok(coords) => coords,
            Err(e) => {
                warn!("Projected to geographic failed for ({}, {}): {}", x, y, e);
                Coordinates::new(x, y)
            }
        }
    }

    /// Convert projected (x, y) meters to geographic degrees, rejecting
    /// input outside the regional grid
    pub fn try_projected_to_geographic(&self, x: f64, y: f64) -> Result<Coordinates> {
        self.inverse_checked(x, y, true)
    }

    /// Convert geographic degrees to projected (x, y) meters
    ///
    /// Same failure policy as [`Self::projected_to_geographic`].
    pub fn geographic_to_projected(&self, lng: f64, lat: f64) -> (f64, f64) {
        match self.forward_checked(lng, lat, false) {
            Ok(xy) => xy,
            Err(e) => {
                warn!("Geographic to projected failed for ({}, {}): {}", lng, lat, e);
                (lng, lat)
            }
        }
    }

    /// Convert geographic degrees to projected meters, rejecting input
    /// outside the region of interest
    pub fn try_geographic_to_projected(&self, lng: f64, lat: f64) -> Result<(f64, f64)> {
        self.forward_checked(lng, lat, true)
    }

    fn inverse_checked(&self, x: f64, y: f64, reject_out_of_region: bool) -> Result<Coordinates> {
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::InvalidCoordinates(format!("({}, {}) is not finite", x, y)));
        }
        if !in_projected_region(x, y) {
            if reject_out_of_region {
                return Err(Error::InvalidCoordinates(format!(
                    "({}, {}) is outside the projected grid",
                    x, y
                )));
            }
            warn!("Projected coordinates ({}, {}) outside expected range", x, y);
        }

        let (lng, lat) = self.projection.inverse(x, y);
        if !lng.is_finite() || !lat.is_finite() {
            return Err(Error::Projection(format!(
                "inverse projection of ({}, {}) is not finite",
                x, y
            )));
        }
        Ok(Coordinates::new(lng, lat))
    }

    fn forward_checked(&self, lng: f64, lat: f64, reject_out_of_region: bool) -> Result<(f64, f64)> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(Error::InvalidCoordinates(format!("({}, {}) is not finite", lng, lat)));
        }
        if !in_geographic_region(lng, lat) {
            if reject_out_of_region {
                return Err(Error::InvalidCoordinates(format!(
                    "({}, {}) is outside the region of interest",
                    lng, lat
                )));
            }
            warn!("Geographic coordinates ({}, {}) outside expected range", lng, lat);
        }

        let (x, y) = self.projection.forward(lng, lat);
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::Projection(format!(
                "forward projection of ({}, {}) is not finite",
                lng, lat
            )));
        }
        Ok((x, y))
    }

    /// Transform one GeoJSON position, keeping any extra ordinates
    ///
    /// Identity when `from == to` or either side is `Unknown`.
    pub fn transform_position(
        &self,
        position: &[f64],
        from: CoordinateSystem,
        to: CoordinateSystem,
    ) -> Result<Vec<f64>> {
        if from == to || from == CoordinateSystem::Unknown || to == CoordinateSystem::Unknown {
            return Ok(position.to_vec());
        }

        let [x, y, rest @ ..] = position else {
            return match self.mode {
                TransformMode::Strict => Err(Error::InvalidCoordinates(format!(
                    "position {:?} has fewer than two ordinates",
                    position
                ))),
                TransformMode::Lenient => {
                    warn!("Skipping short position {:?}", position);
                    Ok(position.to_vec())
                }
            };
        };

        let (nx, ny) = match (from, self.mode) {
            (CoordinateSystem::Projected, TransformMode::Lenient) => {
                let c = self.projected_to_geographic(*x, *y);
                (c.lng, c.lat)
            }
            (CoordinateSystem::Projected, TransformMode::Strict) => {
                let c = self.try_projected_to_geographic(*x, *y)?;
                (c.lng, c.lat)
            }
            (_, TransformMode::Lenient) => self.geographic_to_projected(*x, *y),
            (_, TransformMode::Strict) => self.try_geographic_to_projected(*x, *y)?,
        };

        let mut out = Vec::with_capacity(position.len());
        out.push(nx);
        out.push(ny);
        out.extend_from_slice(rest);
        Ok(out)
    }

    fn transform_positions(
        &self,
        positions: &[Vec<f64>],
        from: CoordinateSystem,
        to: CoordinateSystem,
    ) -> Result<Vec<Vec<f64>>> {
        positions
            .iter()
            .map(|p| self.transform_position(p, from, to))
            .collect()
    }

    fn transform_rings(
        &self,
        rings: &[Vec<Vec<f64>>],
        from: CoordinateSystem,
        to: CoordinateSystem,
    ) -> Result<Vec<Vec<Vec<f64>>>> {
        rings
            .iter()
            .map(|ring| self.transform_positions(ring, from, to))
            .collect()
    }

    /// Transform the coordinates of a geometry
    ///
    /// Nesting depth follows the geometry type: Point 0, LineString and
    /// MultiPoint 1, Polygon and MultiLineString 2, MultiPolygon 3.
    /// GeometryCollection is not a supported type and passes through
    /// unchanged.
    pub fn transform_geometry(
        &self,
        value: &Value,
        from: CoordinateSystem,
        to: CoordinateSystem,
    ) -> Result<Value> {
        let transformed = match value {
            Value::Point(p) => Value::Point(self.transform_position(p, from, to)?),
            Value::MultiPoint(ps) => Value::MultiPoint(self.transform_positions(ps, from, to)?),
            Value::LineString(ps) => Value::LineString(self.transform_positions(ps, from, to)?),
            Value::Polygon(rings) => Value::Polygon(self.transform_rings(rings, from, to)?),
            Value::MultiLineString(lines) => {
                Value::MultiLineString(self.transform_rings(lines, from, to)?)
            }
            Value::MultiPolygon(polygons) => Value::MultiPolygon(
                polygons
                    .iter()
                    .map(|rings| self.transform_rings(rings, from, to))
                    .collect::<Result<_>>()?,
            ),
            Value::GeometryCollection(_) => {
                debug!("Passing GeometryCollection through untransformed");
                value.clone()
            }
        };
        Ok(transformed)
    }

    /// Reproject a feature collection
    ///
    /// When `from` is `None` the source system is read from the collection's
    /// `crs` member and corroborated against sampled coordinates. A
    /// collection already in the target system is returned unchanged.
    /// Transformed features carry a `_transform` property, and the
    /// collection a `_transform` summary plus a `crs` member naming the
    /// target system.
    pub fn transform_feature_collection(
        &self,
        collection: &FeatureCollection,
        from: Option<CoordinateSystem>,
        to: CoordinateSystem,
    ) -> Result<FeatureCollection> {
        let from = from.unwrap_or_else(|| detect_collection_crs(collection));

        if from == to {
            debug!("Collection already in {}, nothing to transform", to);
            return Ok(collection.clone());
        }
        if from == CoordinateSystem::Unknown || to == CoordinateSystem::Unknown {
            let message = format!("Cannot transform from {} to {}", from, to);
            return match self.mode {
                TransformMode::Strict => Err(Error::Projection(message)),
                TransformMode::Lenient => {
                    warn!("{}; returning collection unchanged", message);
                    Ok(collection.clone())
                }
            };
        }

        let timestamp = chrono::Utc::now().to_rfc3339();
        let provenance = json!({
            "from": from,
            "to": to,
            "timestamp": timestamp,
        });

        let features = collection
            .features
            .iter()
            .map(|feature| {
                let mut feature = feature.clone();
                if let Some(geometry) = feature.geometry.as_mut() {
                    geometry.value = self.transform_geometry(&geometry.value, from, to)?;
                    geometry.bbox = None;
                }
                feature.bbox = None;
                feature
                    .properties
                    .get_or_insert_with(JsonObject::new)
                    .insert(TRANSFORM_KEY.to_string(), provenance.clone());
                Ok(feature)
            })
            .collect::<Result<Vec<Feature>>>()?;

        let mut members = collection.foreign_members.clone().unwrap_or_default();
        let crs_name = match to {
            CoordinateSystem::Projected => PROJECTED_CRS_NAME,
            _ => GEOGRAPHIC_CRS_NAME,
        };
        members.insert(
            "crs".to_string(),
            json!({ "type": "name", "properties": { "name": crs_name } }),
        );
        members.insert(
            TRANSFORM_KEY.to_string(),
            json!({
                "from": from,
                "to": to,
                "timestamp": timestamp,
                "feature_count": features.len(),
            }),
        );

        debug!("Transformed {} features from {} to {}", features.len(), from, to);

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(members),
        })
    }
}

/// Read the CRS declared in a collection's `crs` member, if recognized
pub fn declared_crs(collection: &FeatureCollection) -> Option<CoordinateSystem> {
    let crs = collection.foreign_members.as_ref()?.get("crs")?;

    let identifier = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .or_else(|| crs.get("name"))
        .and_then(|n| n.as_str())
        .or_else(|| crs.as_str())?;

    CoordinateSystem::from_identifier(identifier)
}

/// Detect a collection's coordinate system from the first sampled position
pub fn sampled_crs(collection: &FeatureCollection) -> CoordinateSystem {
    collection
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .find_map(|g| first_position(&g.value))
        .map(|c| detect(c.lng, c.lat))
        .unwrap_or(CoordinateSystem::Unknown)
}

/// Determine a collection's coordinate system
///
/// Declared metadata wins unless the sampled coordinates clearly belong to
/// the other system.
pub fn detect_collection_crs(collection: &FeatureCollection) -> CoordinateSystem {
    let sampled = sampled_crs(collection);
    match declared_crs(collection) {
        Some(declared) if sampled != CoordinateSystem::Unknown && sampled != declared => {
            warn!(
                "Collection declares {} but coordinates look {}; using {}",
                declared, sampled, sampled
            );
            sampled
        }
        Some(declared) => declared,
        None => sampled,
    }
}

fn first_position(value: &Value) -> Option<Coordinates> {
    let position = match value {
        Value::Point(p) => Some(p),
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.first(),
        Value::Polygon(rings) | Value::MultiLineString(rings) => rings.first()?.first(),
        Value::MultiPolygon(polygons) => polygons.first()?.first()?.first(),
        Value::GeometryCollection(geometries) => {
            return geometries.iter().find_map(|g| first_position(&g.value))
        }
    };
    position.and_then(|p| Coordinates::from_position(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geojson::Geometry;

    fn transformer() -> CoordinateTransformer {
        CoordinateTransformer::new(ProjectionParams::default())
    }

    fn point_feature(x: f64, y: f64) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![x, y]))),
            id: None,
            properties: None,
            foreign_members: None,
        }
    }

    fn collection(features: Vec<Feature>, crs: Option<&str>) -> FeatureCollection {
        let foreign_members = crs.map(|name| {
            let mut members = JsonObject::new();
            members.insert(
                "crs".to_string(),
                json!({ "type": "name", "properties": { "name": name } }),
            );
            members
        });
        FeatureCollection {
            bbox: None,
            features,
            foreign_members,
        }
    }

    #[test]
    fn test_round_trip_projected() {
        let t = transformer();
        let c = t.projected_to_geographic(165_295.0, 2_540_755.07);
        let (x, y) = t.geographic_to_projected(c.lng, c.lat);
        assert_abs_diff_eq!(x, 165_295.0, epsilon = 1.0);
        assert_abs_diff_eq!(y, 2_540_755.07, epsilon = 1.0);
    }

    #[test]
    fn test_round_trip_geographic() {
        let t = transformer();
        let (x, y) = t.geographic_to_projected(120.20, 22.99);
        let c = t.projected_to_geographic(x, y);
        assert_abs_diff_eq!(c.lng, 120.20, epsilon = 1e-5);
        assert_abs_diff_eq!(c.lat, 22.99, epsilon = 1e-5);
    }

    #[test]
    fn test_out_of_range_still_converted() {
        let t = transformer();
        // Outside the regional grid, but the formula is still applied
        let c = t.projected_to_geographic(450_000.0, 2_900_000.0);
        assert!(c.lng > 121.0);
        assert!(c.lat > 25.5);
    }

    #[test]
    fn test_non_finite_falls_back_to_input() {
        let t = transformer();
        let c = t.projected_to_geographic(f64::NAN, 2_540_755.0);
        assert!(c.lng.is_nan());
        assert_eq!(c.lat, 2_540_755.0);
    }

    #[test]
    fn test_strict_rejects_out_of_region() {
        let t = transformer();
        assert!(t.try_projected_to_geographic(450_000.0, 2_900_000.0).is_err());
        assert!(t.try_geographic_to_projected(-74.0, 40.7).is_err());
        assert!(t.try_projected_to_geographic(165_295.0, 2_540_755.07).is_ok());
    }

    #[test]
    fn test_transform_position_keeps_extra_ordinates() {
        let t = transformer();
        let out = t
            .transform_position(
                &[165_295.0, 2_540_755.07, 42.0],
                CoordinateSystem::Projected,
                CoordinateSystem::Geographic,
            )
            .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[2], 42.0);
        assert_abs_diff_eq!(out[0], 120.173_936, epsilon = 1e-5);
    }

    #[test]
    fn test_transform_position_identity() {
        let t = transformer();
        let p = [120.2, 22.99];
        assert_eq!(
            t.transform_position(&p, CoordinateSystem::Geographic, CoordinateSystem::Geographic)
                .unwrap(),
            p.to_vec()
        );
        assert_eq!(
            t.transform_position(&p, CoordinateSystem::Unknown, CoordinateSystem::Projected)
                .unwrap(),
            p.to_vec()
        );
    }

    #[test]
    fn test_transform_geometry_nesting() {
        let t = transformer();
        let ring = vec![
            vec![165_000.0, 2_540_000.0],
            vec![166_000.0, 2_540_000.0],
            vec![166_000.0, 2_541_000.0],
            vec![165_000.0, 2_540_000.0],
        ];
        let multi = Value::MultiPolygon(vec![vec![ring.clone()], vec![ring]]);

        let out = t
            .transform_geometry(&multi, CoordinateSystem::Projected, CoordinateSystem::Geographic)
            .unwrap();

        let Value::MultiPolygon(polygons) = out else {
            panic!("expected MultiPolygon");
        };
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0][0].len(), 4);
        for position in polygons.iter().flatten().flatten() {
            assert!(position[0] > 120.0 && position[0] < 121.0);
            assert!(position[1] > 22.0 && position[1] < 24.0);
        }
    }

    #[test]
    fn test_transform_geometry_collection_passes_through() {
        let t = transformer();
        let gc = Value::GeometryCollection(vec![Geometry::new(Value::Point(vec![
            165_295.0,
            2_540_755.07,
        ]))]);
        let out = t
            .transform_geometry(&gc, CoordinateSystem::Projected, CoordinateSystem::Geographic)
            .unwrap();
        assert_eq!(out, gc);
    }

    #[test]
    fn test_strict_short_position_fails() {
        let t = transformer().with_mode(TransformMode::Strict);
        let result = t.transform_geometry(
            &Value::Point(vec![165_295.0]),
            CoordinateSystem::Projected,
            CoordinateSystem::Geographic,
        );
        assert!(result.is_err());

        let lenient = transformer();
        let out = lenient
            .transform_geometry(
                &Value::Point(vec![165_295.0]),
                CoordinateSystem::Projected,
                CoordinateSystem::Geographic,
            )
            .unwrap();
        assert_eq!(out, Value::Point(vec![165_295.0]));
    }

    #[test]
    fn test_detect_collection_from_metadata() {
        let fc = collection(
            vec![point_feature(165_295.0, 2_540_755.07)],
            Some("urn:ogc:def:crs:EPSG::3826"),
        );
        assert_eq!(declared_crs(&fc), Some(CoordinateSystem::Projected));
        assert_eq!(detect_collection_crs(&fc), CoordinateSystem::Projected);
    }

    #[test]
    fn test_detect_collection_sampled_overrides_metadata() {
        let fc = collection(vec![point_feature(120.2, 22.99)], Some("EPSG:3826"));
        assert_eq!(detect_collection_crs(&fc), CoordinateSystem::Geographic);
    }

    #[test]
    fn test_detect_collection_by_sampling() {
        let fc = collection(vec![point_feature(165_295.0, 2_540_755.07)], None);
        assert_eq!(declared_crs(&fc), None);
        assert_eq!(detect_collection_crs(&fc), CoordinateSystem::Projected);

        let empty = collection(vec![], None);
        assert_eq!(detect_collection_crs(&empty), CoordinateSystem::Unknown);
    }

    #[test]
    fn test_transform_feature_collection_annotates() {
        let t = transformer();
        let fc = collection(
            vec![
                point_feature(165_295.0, 2_540_755.07),
                point_feature(167_982.27, 2_543_399.44),
            ],
            None,
        );

        let out = t
            .transform_feature_collection(&fc, None, CoordinateSystem::Geographic)
            .unwrap();

        assert_eq!(out.features.len(), 2);
        let members = out.foreign_members.as_ref().unwrap();
        assert_eq!(members["crs"]["properties"]["name"], GEOGRAPHIC_CRS_NAME);
        assert_eq!(members[TRANSFORM_KEY]["from"], "projected");
        assert_eq!(members[TRANSFORM_KEY]["to"], "geographic");
        assert_eq!(members[TRANSFORM_KEY]["feature_count"], 2);

        let feature = &out.features[1];
        let provenance = &feature.properties.as_ref().unwrap()[TRANSFORM_KEY];
        assert_eq!(provenance["from"], "projected");
        assert!(provenance["timestamp"].is_string());

        let Value::Point(p) = &feature.geometry.as_ref().unwrap().value else {
            panic!("expected Point");
        };
        assert_abs_diff_eq!(p[0], 120.2, epsilon = 1e-5);
        assert_abs_diff_eq!(p[1], 22.99, epsilon = 1e-5);
    }

    #[test]
    fn test_transform_feature_collection_to_projected() {
        let t = transformer();
        let input = collection(vec![point_feature(120.2, 22.99)], None);

        let output = t
            .transform_feature_collection(&input, None, CoordinateSystem::Projected)
            .unwrap();

        match &output.features[0].geometry.as_ref().unwrap().value {
            Value::Point(position) => {
                assert_abs_diff_eq!(position[0], 167_982.27, epsilon = 0.05);
                assert_abs_diff_eq!(position[1], 2_543_399.44, epsilon = 0.05);
            }
            other => panic!("unexpected geometry {:?}", other),
        }

        let members = output.foreign_members.as_ref().unwrap();
        assert_eq!(members["crs"]["properties"]["name"], PROJECTED_CRS_NAME);
        assert_eq!(members["crs"]["properties"]["name"], "EPSG:3826");
        assert_eq!(members[TRANSFORM_KEY]["from"], "geographic");
        assert_eq!(members[TRANSFORM_KEY]["to"], "projected");
        assert_eq!(detect_collection_crs(&output), CoordinateSystem::Projected);
    }

    #[test]
    fn test_transform_feature_collection_noop() {
        let t = transformer();
        let fc = collection(vec![point_feature(120.2, 22.99)], None);

        let out = t
            .transform_feature_collection(&fc, None, CoordinateSystem::Geographic)
            .unwrap();
        assert_eq!(out, fc);
    }

    #[test]
    fn test_transform_feature_collection_unknown_source() {
        let fc = collection(vec![point_feature(500.0, 20.0)], None);

        let lenient = transformer();
        let out = lenient
            .transform_feature_collection(&fc, None, CoordinateSystem::Geographic)
            .unwrap();
        assert_eq!(out, fc);

        let strict = transformer().with_mode(TransformMode::Strict);
        assert!(strict
            .transform_feature_collection(&fc, None, CoordinateSystem::Geographic)
            .is_err());
    }
}
