//! White-label branding endpoints backed by the single JSON config file.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::{json_body, AppState};
use crate::error::ApiError;
use crate::service::white_label::{templates, ConfigUpdate, WhiteLabelConfig};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/white-label/config", get(get_config).put(update_config))
        .route("/white-label/templates", get(list_templates))
}

/// GET /api/white-label/config
async fn get_config(State(state): State<AppState>) -> Json<WhiteLabelConfig> {
    Json(state.white_label.get().await)
}

/// PUT /api/white-label/config
async fn update_config(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let changes = json_body(body);
    match state.white_label.update(&changes).await? {
        ConfigUpdate::Applied(config) => {
            tracing::info!(company = %config.company_name, "white-label config updated");
            Ok(Json(config).into_response())
        }
        ConfigUpdate::Invalid(errors) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "errors": errors })),
        )
            .into_response()),
    }
}

/// GET /api/white-label/templates
async fn list_templates() -> Json<Value> {
    Json(templates())
}
