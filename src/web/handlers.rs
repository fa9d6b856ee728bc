//! Request handlers for the scan API.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::context::AppContext;
use crate::core::models::{CancelError, ScanTool};

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub target: String,
    #[serde(default = "default_tool")]
    pub tool: String,
}

fn default_tool() -> String {
    "zap".to_string()
}

/// Daemon status/health information.
#[derive(Debug, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub version: String,
    pub uptime_secs: u64,
    pub executor: String,
    pub jobs_total: usize,
    pub jobs_active: usize,
}

/// Accept a scan job. The job starts in the background; the response only
/// carries the id to poll.
pub async fn submit_scan(
    State(ctx): State<AppContext>,
    Json(req): Json<SubmitRequest>,
) -> Response {
    if let Err(reason) = validate_target(&req.target) {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, &reason);
    }
    let Some(tool) = ScanTool::from_str(&req.tool) else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("unknown tool: {}", req.tool),
        );
    };

    let job_id = ctx.scans.submit(req.target, tool).await;
    (
        StatusCode::ACCEPTED,
        Json(json!({ "job_id": job_id, "status": "queued" })),
    )
        .into_response()
}

/// Poll a job. Terminal jobs stay queryable.
pub async fn scan_status(State(ctx): State<AppContext>, Path(job_id): Path<String>) -> Response {
    match ctx.scans.status(&job_id).await {
        Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "job not found"),
    }
}

/// Request cancellation of a queued or running job.
pub async fn cancel_scan(State(ctx): State<AppContext>, Path(job_id): Path<String>) -> Response {
    match ctx.scans.cancel(&job_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "job_id": job_id, "status": "cancelled" })),
        )
            .into_response(),
        Err(CancelError::NotFound) => error_response(StatusCode::NOT_FOUND, "job not found"),
        Err(err @ CancelError::AlreadyFinished) => {
            error_response(StatusCode::CONFLICT, &err.to_string())
        }
    }
}

/// Get daemon status/health information.
pub async fn daemon_status(State(ctx): State<AppContext>) -> Json<DaemonStatus> {
    Json(DaemonStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: ctx.uptime_secs(),
        executor: ctx.config.executor.as_str().to_string(),
        jobs_total: ctx.scans.job_count().await,
        jobs_active: ctx.scans.active_count().await,
    })
}

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Targets must be absolute http/https URLs. The raw string is what gets
/// stored and scanned; parsing is validation only.
fn validate_target(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|err| format!("invalid target url: {err}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported target scheme: {other}")),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
