//! Monitor-rule endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::repos::{MonitorRule, RuleRepo};
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Monitor rule response
#[derive(Serialize)]
pub struct RuleResponse {
    pub endpoint: String,
    pub monitor: bool,
    pub time_added: String,
    pub version_added: String,
    pub last_accessed: Option<String>,
}

impl From<MonitorRule> for RuleResponse {
    fn from(r: MonitorRule) -> Self {
        Self {
            endpoint: r.endpoint,
            monitor: r.monitor,
            time_added: r.time_added.to_rfc3339(),
            version_added: r.version_added,
            last_accessed: r.last_accessed.map(|t| t.to_rfc3339()),
        }
    }
}

/// Update rule request
#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub monitor: bool,
}

/// GET /api/rules/{endpoint} - fetch the rule, creating it when unseen
async fn get_rule(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
) -> Result<Json<RuleResponse>, ApiError> {
    let rule = RuleRepo::new(&state.pool)
        .get_or_create(&endpoint, &state.config.version)
        .await?;
    Ok(Json(rule.into()))
}

/// PUT /api/rules/{endpoint} - set the monitor flag
async fn update_rule(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
    Json(req): Json<UpdateRuleRequest>,
) -> Result<Json<RuleResponse>, ApiError> {
    let repo = RuleRepo::new(&state.pool);
    repo.set_monitor(&endpoint, req.monitor).await?;

    // endpoint exists after set_monitor succeeded
    let rule = repo.get_or_create(&endpoint, &state.config.version).await?;
    Ok(Json(rule.into()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/rules/{endpoint}", get(get_rule).put(update_rule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_pool;
    use crate::http::server::{build_router, AppState};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use perfdash_core::DashboardConfig;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn test_app() -> axum::Router {
        let pool = test_pool().await;
        build_router(AppState {
            pool,
            config: DashboardConfig::default(),
        })
    }

    #[tokio::test]
    async fn get_creates_rule_on_first_access() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/rules/%2Fusers")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let rule: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(rule["endpoint"], "/users");
        assert_eq!(rule["monitor"], false);
        assert_eq!(rule["version_added"], "1.0");

        // second access returns the same rule
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/rules/%2Fusers")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let again: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(again["time_added"], rule["time_added"]);
    }

    #[tokio::test]
    async fn put_flips_monitor_flag() {
        let app = test_app().await;

        // create first
        app.clone()
            .oneshot(
                Request::builder()
                    .uri("/api/rules/%2Fusers")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/rules/%2Fusers")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"monitor": true}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let rule: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(rule["monitor"], true);
    }

    #[tokio::test]
    async fn put_unknown_endpoint_is_404() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/rules/%2Fmissing")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"monitor": true}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
