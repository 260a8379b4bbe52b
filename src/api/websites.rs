//! Website listings and cross-site audit statistics.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AppState, PageParams};
use crate::domain::models::{Audit, Pagination, Website};
use crate::domain::round2;
use crate::error::{ApiError, AppError};
use crate::repository::sqlite::{AuditRepository, WebsiteRepository};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/websites", get(list_websites))
        .route("/websites/stats", get(website_stats))
        .route("/websites/{id}", get(get_website))
        .route("/websites/{id}/audits", get(website_audits))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<i64>,
    per_page: Option<i64>,
    search: Option<String>,
}

fn website_json(site: &Website) -> Value {
    json!({
        "id": site.id,
        "domain": site.domain,
        "title": site.title,
        "description": site.description,
        "favicon_url": site.favicon_url,
        "first_analyzed": site.first_analyzed.map(|at| at.to_rfc3339()),
        "last_analyzed": site.last_analyzed.map(|at| at.to_rfc3339()),
        "total_audits": site.total_audits,
        "average_score": site.average_score,
    })
}

/// GET /api/websites
async fn list_websites(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (page, per_page) = PageParams {
        page: query.page,
        per_page: query.per_page,
    }
    .window();
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let websites = WebsiteRepository::new(state.pool.clone());
    let audits = AuditRepository::new(state.pool.clone());

    let (rows, total) = websites.list(page, per_page, search).await?;

    let mut items = Vec::with_capacity(rows.len());
    for site in &rows {
        let latest = audits.latest_for_website(site.id).await?;
        let mut entry = website_json(site);
        entry["latest_audit"] = match latest {
            Some(audit) => json!({
                "id": audit.id,
                "overall_score": audit.overall_score,
                "status": audit.status.as_str(),
                "started_at": audit.started_at.to_rfc3339(),
            }),
            None => Value::Null,
        };
        items.push(entry);
    }

    Ok(Json(json!({
        "websites": items,
        "pagination": Pagination::new(page, per_page, total),
    })))
}

/// GET /api/websites/{id}
async fn get_website(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let websites = WebsiteRepository::new(state.pool.clone());
    let audits = AuditRepository::new(state.pool.clone());

    let site = websites
        .get_by_id(id)
        .await?
        .ok_or(AppError::WebsiteNotFound(id))?;
    let recent = audits.recent_for_website(site.id, 10).await?;

    let recent_audits: Vec<Value> = recent
        .iter()
        .map(|audit: &Audit| {
            json!({
                "id": audit.id,
                "url": audit.url,
                "overall_score": audit.overall_score,
                "status": audit.status.as_str(),
                "started_at": audit.started_at.to_rfc3339(),
                "completed_at": audit.completed_at.map(|at| at.to_rfc3339()),
            })
        })
        .collect();

    let mut payload = website_json(&site);
    payload["recent_audits"] = Value::Array(recent_audits);
    Ok(Json(payload))
}

/// GET /api/websites/{id}/audits
async fn website_audits(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let (page, per_page) = params.window();

    let websites = WebsiteRepository::new(state.pool.clone());
    let audits = AuditRepository::new(state.pool.clone());

    let site = websites
        .get_by_id(id)
        .await?
        .ok_or(AppError::WebsiteNotFound(id))?;
    let (rows, total) = audits.list_for_website(site.id, page, per_page).await?;

    let items: Vec<Value> = rows
        .iter()
        .map(|audit| {
            json!({
                "id": audit.id,
                "url": audit.url,
                "overall_score": audit.overall_score,
                "status": audit.status.as_str(),
                "audit_type": audit.audit_type,
                "started_at": audit.started_at.to_rfc3339(),
                "completed_at": audit.completed_at.map(|at| at.to_rfc3339()),
                "error_message": audit.error_message,
            })
        })
        .collect();

    Ok(Json(json!({
        "website": {
            "id": site.id,
            "domain": site.domain,
            "title": site.title,
        },
        "audits": items,
        "pagination": Pagination::new(page, per_page, total),
    })))
}

/// GET /api/websites/stats
async fn website_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let websites = WebsiteRepository::new(state.pool.clone());
    let audits = AuditRepository::new(state.pool.clone());

    let total_websites = websites.count().await?;
    let stats = audits.stats().await?;
    let recent = audits.recent_with_domain(5).await?;

    let success_rate = if stats.total_audits > 0 {
        round2(stats.completed_audits as f64 / stats.total_audits as f64 * 100.0)
    } else {
        0.0
    };

    let recent_activity: Vec<Value> = recent
        .iter()
        .map(|audit| {
            json!({
                "id": audit.id,
                "domain": audit.domain,
                "url": audit.url,
                "overall_score": audit.overall_score,
                "status": audit.status.as_str(),
                "started_at": audit.started_at.to_rfc3339(),
            })
        })
        .collect();

    Ok(Json(json!({
        "total_websites": total_websites,
        "total_audits": stats.total_audits,
        "completed_audits": stats.completed_audits,
        "failed_audits": stats.failed_audits,
        "success_rate": success_rate,
        "average_score": stats.average_score.map(round2).unwrap_or(0.0),
        "recent_activity": recent_activity,
    })))
}
