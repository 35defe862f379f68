//! HTTP API routes
//!
//! Defines all REST API endpoints for the server.

use crate::analysis::{self, AnalysisRequest, AnalysisResponse};
use crate::crs::{self, CoordinateSystem, ProjectionParams, TransformMode};
use crate::error::Error;
use crate::format::{available_formats, FormatInfo};
use crate::server::state::AppState;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze_handler))
        .route("/api/transform", post(transform_handler))
        .route("/api/detect", post(detect_handler))
        .route("/api/status", get(status_handler))
        .route("/api/formats", get(formats_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidCoordinates(_) => "INVALID_COORDINATES",
            Error::Projection(_) => "PROJECTION_ERROR",
            Error::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            Error::InvalidParameter(_) => "INVALID_PARAMETER",
            Error::Random(_) => "RANDOM_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Json(_) | Error::GeoJson(_) => "INVALID_INPUT",
            _ => "INTERNAL_ERROR",
        };
        ApiError {
            error: err.to_string(),
            code: code.to_string(),
        }
    }
}

/// Run an analysis
///
/// POST /api/analyze
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let config = state.config().await;
    let response = analysis::run(&req, &config)?;
    Ok(Json(response))
}

/// Transform request body
#[derive(Debug, Deserialize)]
pub struct TransformRequest {
    pub collection: FeatureCollection,
    /// Source system; detected when unset
    #[serde(default)]
    pub from: Option<CoordinateSystem>,
    /// Target system, geographic when unset
    #[serde(default)]
    pub to: Option<CoordinateSystem>,
    /// Overrides the configured failure mode
    #[serde(default)]
    pub strict: Option<bool>,
}

/// Reproject a FeatureCollection
///
/// POST /api/transform
async fn transform_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransformRequest>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let config = state.config().await;

    let mut transformer = config.transformer();
    if let Some(strict) = req.strict {
        transformer = transformer.with_mode(if strict {
            TransformMode::Strict
        } else {
            TransformMode::Lenient
        });
    }

    let transformed =
        transformer.transform_feature_collection(&req.collection, req.from, req.to.unwrap_or_default())?;
    Ok(Json(transformed))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetectRequest {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetectResponse {
    pub crs: CoordinateSystem,
}

/// Detect the coordinate system of one pair
///
/// POST /api/detect
async fn detect_handler(Json(req): Json<DetectRequest>) -> Json<DetectResponse> {
    Json(DetectResponse {
        crs: crs::detect(req.x, req.y),
    })
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server is running
    pub running: bool,
    /// Server version
    pub version: String,
    /// Active projection parameters
    pub projection: ProjectionParams,
    /// Transform failure mode
    pub transform_mode: TransformMode,
    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let config = state.config().await;

    Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        projection: config.projection.params(),
        transform_mode: config.projection.mode(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Formats list response
#[derive(Debug, Serialize, Deserialize)]
pub struct FormatsResponse {
    pub formats: Vec<FormatInfo>,
}

/// List available output formats
///
/// GET /api/formats
async fn formats_handler() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        formats: available_formats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;
    use crate::config::Config;
    use axum::body::{Body, Bytes};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    fn create_test_state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::default()))
    }

    async fn post_json(uri: &str, body: serde_json::Value) -> (StatusCode, Bytes) {
        let app = create_router(create_test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    fn sample_points() -> serde_json::Value {
        json!([
            {"lng": 120.20, "lat": 23.00, "value": 1.0},
            {"lng": 120.21, "lat": 23.00, "value": 2.0},
            {"lng": 120.20, "lat": 23.01, "value": 3.0},
            {"lng": 120.21, "lat": 23.01, "value": 4.0},
            {"lng": 120.50, "lat": 23.30, "value": 9.0}
        ])
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let status: StatusResponse = serde_json::from_slice(&body).unwrap();

        assert!(status.running);
        assert_eq!(status.projection.central_meridian, 121.0);
        assert_eq!(status.transform_mode, TransformMode::Lenient);
    }

    #[tokio::test]
    async fn test_formats_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/api/formats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let formats: FormatsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(formats.formats.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_rejects_oversized_parameters() {
        for analysis in [
            json!({"type": "kmeans", "k": 17_592_186_044_416u64}),
            json!({"type": "heatmap", "grid_size": 4_294_967_296u64}),
        ] {
            let (status, body) = post_json("/api/analyze", json!({"points": sample_points(), "analysis": analysis})).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            let error: ApiError = serde_json::from_slice(&body).unwrap();
            assert_eq!(error.code, "INVALID_PARAMETER");
        }
    }

    #[tokio::test]
    async fn test_analyze_dbscan() {
        let (status, body) = post_json(
            "/api/analyze",
            json!({
                "points": sample_points(),
                "analysis": {"type": "dbscan", "eps_km": 2.0, "min_pts": 2}
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: AnalysisResponse = serde_json::from_slice(&body).unwrap();
        match response.result {
            AnalysisResult::Dbscan { labels, summary } => {
                assert_eq!(labels, vec![0, 0, 0, 0, -1]);
                assert_eq!(summary.cluster_count, 1);
                assert_eq!(summary.noise_count, 1);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(response.metadata.point_count, 5);
    }

    #[tokio::test]
    async fn test_analyze_kmeans_with_seed() {
        let request = json!({
            "points": sample_points(),
            "analysis": {"type": "kmeans", "k": 2, "seed": 11}
        });

        let (status, body) = post_json("/api/analyze", request).await;
        assert_eq!(status, StatusCode::OK);

        let response: AnalysisResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.metadata.random_source.as_deref(), Some("seeded"));
    }

    #[tokio::test]
    async fn test_analyze_invalid_parameter() {
        let (status, body) = post_json(
            "/api/analyze",
            json!({"points": sample_points(), "analysis": {"type": "lisa", "k": 0}}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "INVALID_PARAMETER");
    }

    #[tokio::test]
    async fn test_analyze_index_out_of_range() {
        let (status, body) = post_json(
            "/api/analyze",
            json!({"points": sample_points(), "analysis": {"type": "knn", "index": 10}}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "INDEX_OUT_OF_RANGE");
    }

    #[tokio::test]
    async fn test_transform_projected_collection() {
        let (status, body) = post_json(
            "/api/transform",
            json!({
                "collection": {
                    "type": "FeatureCollection",
                    "features": [{
                        "type": "Feature",
                        "geometry": {"type": "Point", "coordinates": [250000.0, 2599651.349]},
                        "properties": {"name": "clinic"}
                    }]
                }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let collection: FeatureCollection = serde_json::from_slice(&body).unwrap();
        let value = &collection.features[0].geometry.as_ref().unwrap().value;
        match value {
            geojson::Value::Point(p) => {
                assert!((p[0] - 121.0).abs() < 1e-6);
                assert!((p[1] - 23.5).abs() < 1e-6);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transform_strict_rejects_unknown() {
        let (status, body) = post_json(
            "/api/transform",
            json!({
                "collection": {
                    "type": "FeatureCollection",
                    "features": [{
                        "type": "Feature",
                        "geometry": {"type": "Point", "coordinates": [500.0, 500.0]},
                        "properties": null
                    }]
                },
                "strict": true
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert!(!error.error.is_empty());
    }

    #[tokio::test]
    async fn test_detect_endpoint() {
        let (status, body) = post_json("/api/detect", json!({"x": 165295.0, "y": 2540755.07})).await;
        assert_eq!(status, StatusCode::OK);
        let detected: DetectResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(detected.crs, CoordinateSystem::Projected);

        let (_, body) = post_json("/api/detect", json!({"x": 120.2, "y": 23.0})).await;
        let detected: DetectResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(detected.crs, CoordinateSystem::Geographic);
    }
}
