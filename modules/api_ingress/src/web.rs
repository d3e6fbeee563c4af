use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::ErrorResponse;

/// Store round-trip the health endpoint runs on every call.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct HealthState {
    pub probe: Arc<dyn HealthProbe>,
    pub started: Instant,
    pub environment: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_time_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthReport {
    status: &'static str,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uptime_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    database: DatabaseStatus,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn health_check(State(state): State<HealthState>) -> Response {
    let started = Instant::now();
    match state.probe.check().await {
        Ok(()) => {
            let report = HealthReport {
                status: "healthy",
                timestamp: now_rfc3339(),
                uptime_seconds: Some(state.started.elapsed().as_secs()),
                environment: Some(state.environment.clone()),
                version: Some(state.version.clone()),
                error: None,
                database: DatabaseStatus {
                    status: "connected",
                    response_time_ms: Some(started.elapsed().as_millis() as u64),
                },
            };
            tracing::debug!(
                response_time_ms = report.database.response_time_ms,
                "Health check passed"
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Health check failed");
            let report = HealthReport {
                status: "unhealthy",
                timestamp: now_rfc3339(),
                uptime_seconds: None,
                environment: None,
                version: None,
                error: Some(e.to_string()),
                database: DatabaseStatus {
                    status: "disconnected",
                    response_time_ms: None,
                },
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(report)).into_response()
        }
    }
}

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub async fn index() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache")],
        Html(INDEX_HTML),
    )
}

pub async fn not_found() -> ErrorResponse {
    ErrorResponse::not_found()
}
