use std::path::PathBuf;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use brandlens_agent::AnalysisMode;
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    mode: AnalysisMode,
    upload_dir: PathBuf,
}

impl HealthState {
    pub fn new(mode: AnalysisMode, upload_dir: PathBuf) -> Self {
        Self { mode, upload_dir }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: &'static str,
    pub service: HealthCheck,
    pub uploads: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let uploads = upload_dir_check(&state.upload_dir).await;
    let ready = uploads.status == "ready";

    let detail = match state.mode {
        AnalysisMode::Model => "analysis service configured",
        AnalysisMode::FallbackOnly => "no analysis credential; serving fallback reports",
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        mode: state.mode.as_str(),
        service: HealthCheck { status: "ready", detail: detail.to_string() },
        uploads,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn upload_dir_check(upload_dir: &std::path::Path) -> HealthCheck {
    match tokio::fs::metadata(upload_dir).await {
        Ok(metadata) if metadata.is_dir() => HealthCheck {
            status: "ready",
            detail: format!("upload directory `{}` is available", upload_dir.display()),
        },
        Ok(_) => HealthCheck {
            status: "degraded",
            detail: format!("upload path `{}` is not a directory", upload_dir.display()),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("upload directory `{}` unavailable: {error}", upload_dir.display()),
        },
    }
}
