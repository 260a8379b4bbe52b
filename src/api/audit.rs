//! Audit endpoints: run a full analysis, read a stored audit, liveness.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::{client_ip, header_str, json_body, AppState};
use crate::error::{ApiError, AppError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/audit/analyze", post(analyze))
        .route("/audit/health", get(health))
        .route("/audit/{id}", get(get_audit))
}

/// POST /api/audit/analyze
async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(body);
    let url = body
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::validation("URL is required"))?;
    let force = body.get("force").and_then(Value::as_bool).unwrap_or(false);

    let user_agent = header_str(&headers, "user-agent");
    let ip_address = client_ip(&headers);

    let response = state
        .runner
        .analyze(url, force, user_agent.as_deref(), ip_address.as_deref())
        .await?;
    Ok(Json(response))
}

/// GET /api/audit/{id}
async fn get_audit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.runner.audit_report(&id).await?))
}

/// GET /api/audit/health
async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "SEO Analyzer Pro API is running",
        "version": "1.0.0",
    }))
}
