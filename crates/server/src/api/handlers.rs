use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use cliprelay_core::{pipeline::PipelineStats, SanitizedConfig};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    pub expression: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_firing: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

pub async fn get_schedule(State(state): State<Arc<AppState>>) -> Json<ScheduleResponse> {
    let schedule = &state.config().schedule;
    Json(ScheduleResponse {
        expression: schedule.expression.clone(),
        enabled: schedule.enabled,
        next_firing: state
            .scheduler()
            .and_then(|s| s.next_firing())
            .map(|t| t.to_rfc3339()),
    })
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PipelineStats>, (StatusCode, Json<ErrorResponse>)> {
    match state.orchestrator().stats() {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    collect_dynamic_metrics(&state);
    encode_metrics()
}
