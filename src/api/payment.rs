//! Pricing endpoints. Only the static plan catalog is exposed.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::AppState;
use crate::service::plans::plan_catalog;

pub fn routes() -> Router<AppState> {
    Router::new().route("/payment/plans", get(pricing_plans))
}

/// GET /api/payment/plans
async fn pricing_plans() -> Json<Value> {
    Json(json!({
        "success": true,
        "plans": plan_catalog(),
    }))
}
