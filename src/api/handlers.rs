//! HTTP handlers.

use axum::extract::{Query, State};
use axum::response::Response;
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::Ordering;

use super::envelope::{ApiErrorResponse, ApiResponse};
use super::ApiState;
use crate::config::{validation, PostureConfig, SensitivityLevels};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
    pub uptime_secs: i64,
    pub shutting_down: bool,
}

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Response {
    let shutting_down = state.cancel_token.is_cancelled();
    ApiResponse::ok(HealthResponse {
        status: if shutting_down { "draining" } else { "ok" },
        active_sessions: state.active_sessions.load(Ordering::Relaxed),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        shutting_down,
    })
}

/// GET /api/v1/config
///
/// The configuration new sessions start from.
pub async fn get_config(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.config.as_ref())
}

/// POST /api/v1/config/validate
///
/// Checks a candidate configuration without applying it.
pub async fn validate_config(axum::Json(candidate): axum::Json<PostureConfig>) -> Response {
    let (errors, warnings) = validation::validate_ranges(&candidate);
    let warnings: Vec<String> = warnings.iter().map(ToString::to_string).collect();
    if errors.is_empty() {
        ApiResponse::ok(serde_json::json!({
            "valid": true,
            "warnings": warnings,
        }))
    } else {
        ApiResponse::ok(serde_json::json!({
            "valid": false,
            "errors": errors,
            "warnings": warnings,
        }))
    }
}

/// GET /api/v1/sensitivity?pitch=1..5&distance=..&roll=..&shoulder_tilt=..
///
/// Concrete thresholds a set of sensitivity levels maps to.
pub async fn sensitivity_thresholds(
    levels: Result<Query<SensitivityLevels>, axum::extract::rejection::QueryRejection>,
) -> Response {
    match levels {
        Ok(Query(levels)) => ApiResponse::ok(serde_json::json!({
            "levels": levels,
            "thresholds": levels.to_thresholds(),
        })),
        Err(e) => ApiErrorResponse::bad_request(format!("Invalid sensitivity levels: {e}")),
    }
}
