//! Backlink store endpoints: per-website listings, metric rollups,
//! row edits, and a CSV export.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{json_body, AppState, PageParams};
use crate::domain::models::{Backlink, Pagination};
use crate::error::{ApiError, AppError};
use crate::repository::sqlite::{BacklinkRepository, BacklinkUpdate, DomainStats, WebsiteRepository};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/backlinks/website/{website_id}", get(website_backlinks))
        .route("/backlinks/metrics/{website_id}", get(metrics))
        .route("/backlinks/domain-stats", get(domain_stats))
        .route("/backlinks/export/{website_id}", get(export))
        .route("/backlinks/{backlink_id}", put(update_backlink).delete(delete_backlink))
}

#[derive(Debug, Deserialize)]
struct BacklinkQuery {
    page: Option<i64>,
    per_page: Option<i64>,
    status: Option<String>,
}

fn backlink_json(link: &Backlink) -> Value {
    json!({
        "id": link.id,
        "source_domain": link.source_domain,
        "source_url": link.source_url,
        "target_url": link.target_url,
        "anchor_text": link.anchor_text,
        "link_type": link.link_type,
        "status": link.status,
        "domain_authority": link.domain_authority,
        "page_authority": link.page_authority,
        "spam_score": link.spam_score,
        "discovered_date": link.discovered_date.to_rfc3339(),
        "last_seen": link.last_seen.map(|at| at.to_rfc3339()),
        "is_internal": link.is_internal,
    })
}

/// GET /api/backlinks/website/{website_id}
async fn website_backlinks(
    State(state): State<AppState>,
    Path(website_id): Path<i64>,
    Query(query): Query<BacklinkQuery>,
) -> Result<Json<Value>, ApiError> {
    let (page, per_page) = PageParams {
        page: query.page,
        per_page: query.per_page,
    }
    .window();
    let status = query.status.as_deref().filter(|s| *s != "all");

    let websites = WebsiteRepository::new(state.pool.clone());
    let backlinks = BacklinkRepository::new(state.pool.clone());

    let site = websites
        .get_by_id(website_id)
        .await?
        .ok_or(AppError::WebsiteNotFound(website_id))?;
    let (rows, total) = backlinks
        .list_for_website(site.id, status, page, per_page)
        .await?;

    Ok(Json(json!({
        "website": {
            "id": site.id,
            "domain": site.domain,
        },
        "backlinks": rows.iter().map(backlink_json).collect::<Vec<_>>(),
        "pagination": Pagination::new(page, per_page, total),
    })))
}

/// GET /api/backlinks/metrics/{website_id}
async fn metrics(
    State(state): State<AppState>,
    Path(website_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let websites = WebsiteRepository::new(state.pool.clone());
    let backlinks = BacklinkRepository::new(state.pool.clone());

    let site = websites
        .get_by_id(website_id)
        .await?
        .ok_or(AppError::WebsiteNotFound(website_id))?;
    let metrics = backlinks.metrics(site.id).await?;

    Ok(Json(json!({
        "website": {
            "id": site.id,
            "domain": site.domain,
        },
        "metrics": metrics,
    })))
}

/// GET /api/backlinks/domain-stats
async fn domain_stats(State(state): State<AppState>) -> Result<Json<DomainStats>, ApiError> {
    let backlinks = BacklinkRepository::new(state.pool.clone());
    Ok(Json(backlinks.domain_stats().await?))
}

/// PUT /api/backlinks/{backlink_id}
async fn update_backlink(
    State(state): State<AppState>,
    Path(backlink_id): Path<i64>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(body);
    if body.as_object().map_or(true, |map| map.is_empty()) {
        return Err(AppError::validation("No data provided").into());
    }
    let update: BacklinkUpdate = serde_json::from_value(body)
        .map_err(|error| AppError::validation(error.to_string()))?;

    let backlinks = BacklinkRepository::new(state.pool.clone());
    let link = backlinks
        .update(backlink_id, &update)
        .await?
        .ok_or(AppError::NotFound {
            entity: "Backlink",
            id: backlink_id,
        })?;

    Ok(Json(json!({
        "id": link.id,
        "status": link.status,
        "message": "Backlink updated successfully",
    })))
}

/// DELETE /api/backlinks/{backlink_id}
async fn delete_backlink(
    State(state): State<AppState>,
    Path(backlink_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let backlinks = BacklinkRepository::new(state.pool.clone());
    if !backlinks.delete(backlink_id).await? {
        return Err(AppError::NotFound {
            entity: "Backlink",
            id: backlink_id,
        }
        .into());
    }

    Ok(Json(json!({
        "message": "Backlink deleted successfully",
    })))
}

/// GET /api/backlinks/export/{website_id}
async fn export(
    State(state): State<AppState>,
    Path(website_id): Path<i64>,
) -> Result<Response, ApiError> {
    let websites = WebsiteRepository::new(state.pool.clone());
    let backlinks = BacklinkRepository::new(state.pool.clone());

    let site = websites
        .get_by_id(website_id)
        .await?
        .ok_or(AppError::WebsiteNotFound(website_id))?;
    let rows = backlinks.all_for_website(site.id).await?;

    let mut csv = String::from(
        "Source Domain,Source URL,Target URL,Anchor Text,Link Type,Status,\
         Domain Authority,Page Authority,Spam Score,Discovered Date,Last Seen\n",
    );
    for link in &rows {
        let fields = [
            csv_field(&link.source_domain),
            csv_field(&link.source_url),
            csv_field(&link.target_url),
            csv_field(link.anchor_text.as_deref().unwrap_or("")),
            csv_field(link.link_type.as_deref().unwrap_or("")),
            csv_field(&link.status),
            link.domain_authority.map(|v| v.to_string()).unwrap_or_default(),
            link.page_authority.map(|v| v.to_string()).unwrap_or_default(),
            link.spam_score.map(|v| v.to_string()).unwrap_or_default(),
            link.discovered_date.to_rfc3339(),
            link.last_seen.map(|at| at.to_rfc3339()).unwrap_or_default(),
        ];
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }

    let filename = format!(
        "backlinks_{}_{}.csv",
        site.domain,
        Utc::now().format("%Y%m%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Quotes a CSV field when it carries a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_field_quotes_only_when_needed() {
        assert_eq!(csv_field("blog.io"), "blog.io");
        assert_eq!(csv_field("best tools, ranked"), "\"best tools, ranked\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
