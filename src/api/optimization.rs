//! Conversion optimization endpoints: cache administration and the
//! lead capture pipeline.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{json_body, AppState};
use crate::error::{ApiError, AppError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/optimization/cache/stats", get(cache_stats))
        .route("/optimization/cache/clear", post(cache_clear))
        .route("/optimization/cache/cleanup", post(cache_cleanup))
        .route("/optimization/leads/capture", post(capture_lead))
        .route("/optimization/leads", get(list_leads))
        .route("/optimization/leads/{lead_id}/status", put(update_lead_status))
        .route("/optimization/leads/analytics", get(lead_analytics))
}

/// GET /api/optimization/cache/stats
async fn cache_stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "stats": state.cache.stats(),
    }))
}

/// POST /api/optimization/cache/clear
async fn cache_clear(State(state): State<AppState>) -> Json<Value> {
    state.cache.clear();
    tracing::info!("analysis cache cleared");
    Json(json!({
        "success": true,
        "message": "Cache cleared successfully",
    }))
}

/// POST /api/optimization/cache/cleanup
async fn cache_cleanup(State(state): State<AppState>) -> Json<Value> {
    let removed = state.cache.cleanup_expired();
    Json(json!({
        "success": true,
        "message": format!("Cleaned up {removed} expired entries"),
    }))
}

/// POST /api/optimization/leads/capture
async fn capture_lead(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let body = json_body(body);
    let email = body
        .get("email")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::validation("Email is required"))?;
    let source = body
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or("website");
    let metadata = body.get("metadata").cloned();

    let lead = state.leads.capture(email, source, metadata).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "lead": lead,
        })),
    ))
}

#[derive(Debug, Default, Deserialize)]
struct LeadQuery {
    status: Option<String>,
    source: Option<String>,
    limit: Option<usize>,
}

/// GET /api/optimization/leads
async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<LeadQuery>,
) -> Json<Value> {
    let leads = state
        .leads
        .list(query.status.as_deref(), query.source.as_deref(), query.limit)
        .await;

    Json(json!({
        "success": true,
        "count": leads.len(),
        "leads": leads,
    }))
}

/// PUT /api/optimization/leads/{lead_id}/status
async fn update_lead_status(
    State(state): State<AppState>,
    Path(lead_id): Path<i64>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(body);
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::validation("Status is required"))?;
    let notes = body.get("notes").and_then(Value::as_str);

    if !state.leads.update_status(lead_id, status, notes).await? {
        return Err(AppError::Missing("Lead not found").into());
    }

    Ok(Json(json!({
        "success": true,
        "message": "Lead status updated successfully",
    })))
}

/// GET /api/optimization/leads/analytics
async fn lead_analytics(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "analytics": state.leads.analytics().await,
    }))
}
