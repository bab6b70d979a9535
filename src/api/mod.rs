//! HTTP / WebSocket API using Axum
//!
//! - `GET  /health` liveness and active session count
//! - `GET  /api/v1/config` configuration new sessions start from
//! - `POST /api/v1/config/validate` check a candidate configuration
//! - `GET  /api/v1/sensitivity` preview the sensitivity-scale mapping
//! - `GET  /ws` posture session over a WebSocket (JSON messages)

pub mod envelope;
pub mod handlers;
pub mod ws;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::PostureConfig;

/// Environment variable with a comma-separated list of allowed CORS origins.
pub const CORS_ORIGINS_ENV_VAR: &str = "POSTURE_CORS_ORIGINS";

/// Shared state for every handler.
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<PostureConfig>,
    /// Cancelled on shutdown; every connection's loop holds a child token
    pub cancel_token: CancellationToken,
    pub active_sessions: Arc<AtomicUsize>,
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    pub fn new(config: PostureConfig, cancel_token: CancellationToken) -> Self {
        Self {
            config: Arc::new(config),
            cancel_token,
            active_sessions: Arc::new(AtomicUsize::new(0)),
            started_at: Utc::now(),
        }
    }
}

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `POSTURE_CORS_ORIGINS` to allow e.g. a desktop UI dev server.
fn build_cors_layer() -> CorsLayer {
    match std::env::var(CORS_ORIGINS_ENV_VAR) {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

fn api_routes() -> Router<ApiState> {
    Router::new()
        .route("/config", get(handlers::get_config))
        .route("/config/validate", post(handlers::validate_config))
        .route("/sensitivity", get(handlers::sensitivity_thresholds))
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws", get(ws::ws_handler))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        create_app(ApiState::new(PostureConfig::default(), CancellationToken::new()))
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let resp = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["data"]["status"], "ok");
        assert_eq!(v["data"]["active_sessions"], 0);
    }

    #[tokio::test]
    async fn test_health_reports_draining() {
        let token = CancellationToken::new();
        token.cancel();
        let resp = create_app(ApiState::new(PostureConfig::default(), token))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let v = body_json(resp).await;
        assert_eq!(v["data"]["status"], "draining");
    }

    #[tokio::test]
    async fn test_get_config() {
        let resp = app()
            .oneshot(Request::get("/api/v1/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["data"]["thresholds"]["pitch_deg"], -10.0);
        assert_eq!(v["data"]["server"]["addr"], "127.0.0.1:8765");
    }

    #[tokio::test]
    async fn test_validate_config_reports_errors() {
        let body = r#"{"thresholds":{"pitch_deg":5.0},"warning":{"repeat_interval_secs":0}}"#;
        let resp = app()
            .oneshot(
                Request::post("/api/v1/config/validate")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["data"]["valid"], false);
        assert_eq!(v["data"]["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_validate_default_config() {
        let resp = app()
            .oneshot(
                Request::post("/api/v1/config/validate")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        let v = body_json(resp).await;
        assert_eq!(v["data"]["valid"], true);
    }

    #[tokio::test]
    async fn test_sensitivity_preview() {
        let resp = app()
            .oneshot(
                Request::get("/api/v1/sensitivity?pitch=5&roll=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["data"]["thresholds"]["pitch"], -5.0);
        assert_eq!(v["data"]["thresholds"]["roll"], 25.0);
        assert_eq!(v["data"]["thresholds"]["distance"], 10.0);
    }

    #[tokio::test]
    async fn test_sensitivity_rejects_garbage() {
        let resp = app()
            .oneshot(
                Request::get("/api/v1/sensitivity?pitch=high")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let resp = app()
            .oneshot(Request::get("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }
}
