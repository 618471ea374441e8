//! Measurement ingestion and per-endpoint query endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::repos::{
    GroupedStat, HourlyStat, Measurement, MeasurementRepo, NewMeasurement, RuleRepo,
};
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Record measurement request
#[derive(Debug, Deserialize)]
pub struct RecordMeasurementRequest {
    pub endpoint: String,
    /// Execution time in milliseconds
    pub execution_time: f64,
    /// Defaults to the configured application version
    pub version: Option<String>,
    pub group_by: Option<String>,
    /// Defaults to now
    pub time: Option<DateTime<Utc>>,
}

/// Measurement response
#[derive(Serialize)]
pub struct MeasurementResponse {
    pub id: i64,
    pub endpoint: String,
    pub execution_time: f64,
    pub version: String,
    pub group_by: Option<String>,
    pub time: String,
}

impl From<Measurement> for MeasurementResponse {
    fn from(m: Measurement) -> Self {
        Self {
            id: m.id,
            endpoint: m.endpoint,
            execution_time: m.execution_time,
            version: m.version,
            group_by: m.group_by,
            time: m.time.to_rfc3339(),
        }
    }
}

/// Hourly statistics response
#[derive(Serialize)]
pub struct HourlyStatResponse {
    pub hour: String,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub count: i64,
}

impl From<HourlyStat> for HourlyStatResponse {
    fn from(s: HourlyStat) -> Self {
        Self {
            hour: s.hour.to_rfc3339(),
            avg: s.avg,
            min: s.min,
            max: s.max,
            count: s.count,
        }
    }
}

/// Grouped statistics response
#[derive(Serialize)]
pub struct GroupedStatResponse {
    pub version: String,
    pub group_by: Option<String>,
    pub count: i64,
    pub average: f64,
}

impl From<GroupedStat> for GroupedStatResponse {
    fn from(s: GroupedStat) -> Self {
        Self {
            version: s.version,
            group_by: s.group_by,
            count: s.count,
            average: s.average,
        }
    }
}

/// POST /api/measurements - ingest one measurement.
///
/// Also makes sure a monitor rule exists for the endpoint and bumps its
/// last accessed time.
async fn record_measurement(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecordMeasurementRequest>,
) -> Result<(StatusCode, Json<MeasurementResponse>), ApiError> {
    if req.endpoint.trim().is_empty() {
        return Err(ApiError::bad_request("endpoint must not be empty"));
    }
    if !req.execution_time.is_finite() || req.execution_time < 0.0 {
        return Err(ApiError::bad_request(
            "execution_time must be a non-negative number of milliseconds",
        ));
    }

    let measurement = NewMeasurement {
        endpoint: req.endpoint,
        execution_time: req.execution_time,
        version: req.version.unwrap_or_else(|| state.config.version.clone()),
        group_by: req.group_by,
        time: req.time.unwrap_or_else(Utc::now),
    };

    let repo = MeasurementRepo::new(&state.pool);
    let id = repo.record(&measurement).await?;

    let rules = RuleRepo::new(&state.pool);
    rules
        .get_or_create(&measurement.endpoint, &measurement.version)
        .await?;
    rules
        .touch_last_accessed(&measurement.endpoint, measurement.time)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MeasurementResponse {
            id,
            endpoint: measurement.endpoint,
            execution_time: measurement.execution_time,
            version: measurement.version,
            group_by: measurement.group_by,
            time: measurement.time.to_rfc3339(),
        }),
    ))
}

/// GET /api/endpoints/{endpoint}/hourly - per-hour execution-time stats
async fn hourly_stats(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
) -> Result<Json<Vec<HourlyStatResponse>>, ApiError> {
    let stats = MeasurementRepo::new(&state.pool)
        .hourly_stats(&endpoint)
        .await?;
    Ok(Json(stats.into_iter().map(Into::into).collect()))
}

/// GET /api/endpoints/{endpoint}/versions - distinct versions seen
async fn versions(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let versions = MeasurementRepo::new(&state.pool).versions(&endpoint).await?;
    Ok(Json(versions))
}

/// GET /api/endpoints/{endpoint}/grouped - stats per (version, group tag)
async fn grouped_stats(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
) -> Result<Json<Vec<GroupedStatResponse>>, ApiError> {
    let stats = MeasurementRepo::new(&state.pool)
        .grouped_stats(&endpoint)
        .await?;
    Ok(Json(stats.into_iter().map(Into::into).collect()))
}

/// GET /api/endpoints/{endpoint}/measurements - raw rows, histogram source
async fn all_measurements(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
) -> Result<Json<Vec<MeasurementResponse>>, ApiError> {
    let rows = MeasurementRepo::new(&state.pool)
        .all_measurements(&endpoint)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/measurements", post(record_measurement))
        .route("/api/endpoints/{endpoint}/hourly", get(hourly_stats))
        .route("/api/endpoints/{endpoint}/versions", get(versions))
        .route("/api/endpoints/{endpoint}/grouped", get(grouped_stats))
        .route(
            "/api/endpoints/{endpoint}/measurements",
            get(all_measurements),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_pool;
    use crate::http::server::build_router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use perfdash_core::DashboardConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app() -> axum::Router {
        let pool = test_pool().await;
        build_router(crate::http::server::AppState {
            pool,
            config: DashboardConfig::default(),
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn record_then_query_measurements() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/measurements",
                json!({ "endpoint": "/users", "execution_time": 12.5 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let created: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(created["endpoint"], "/users");
        // version defaulted from config
        assert_eq!(created["version"], "1.0");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/endpoints/%2Fusers/measurements")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let rows: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["execution_time"], 12.5);
    }

    #[tokio::test]
    async fn record_rejects_empty_endpoint() {
        let app = test_app().await;

        let response = app
            .oneshot(post_json(
                "/api/measurements",
                json!({ "endpoint": "  ", "execution_time": 1.0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn record_rejects_negative_execution_time() {
        let app = test_app().await;

        let response = app
            .oneshot(post_json(
                "/api/measurements",
                json!({ "endpoint": "/users", "execution_time": -3.0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn record_creates_monitor_rule() {
        let pool = test_pool().await;
        let app = build_router(crate::http::server::AppState {
            pool: pool.clone(),
            config: DashboardConfig::default(),
        });

        let response = app
            .oneshot(post_json(
                "/api/measurements",
                json!({
                    "endpoint": "/users",
                    "execution_time": 1.0,
                    "time": "2024-06-01T10:00:00Z"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let rules = RuleRepo::new(&pool).last_accessed_times().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].endpoint, "/users");
        assert!(rules[0].last_accessed.is_some());
    }
}
