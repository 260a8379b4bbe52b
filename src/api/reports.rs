//! Report endpoints: render an audit to disk, list, download, delete.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::{json_body, AppState, PageParams};
use crate::domain::models::{AuditStatus, Pagination};
use crate::error::{ApiError, AppError};
use crate::repository::sqlite::{
    AuditRepository, DetailRepository, MetricsRepository, ReportRepository, SecurityRepository,
    WebsiteRepository,
};
use crate::service::report::{report_filename, ReportData, ReportFormat, ReportGenerator};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/generate", post(generate))
        .route("/reports", get(list_reports))
        .route("/reports/{report_id}/download", get(download))
        .route("/reports/{report_id}", delete(delete_report))
}

/// POST /api/reports/generate
///
/// Renders a report for a completed audit. If the same report type was
/// already rendered and the file is still on disk, the existing row is
/// returned instead of rendering again.
async fn generate(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let body = json_body(body);
    let audit_id = body
        .get("audit_id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::validation("Audit ID is required"))?;
    let raw_type = body
        .get("report_type")
        .and_then(Value::as_str)
        .unwrap_or("html");
    let format = ReportFormat::parse(raw_type)
        .ok_or_else(|| AppError::validation(format!("Unsupported report type: {raw_type}")))?;

    let audits = AuditRepository::new(state.pool.clone());
    let audit = audits
        .get_by_id(audit_id)
        .await?
        .ok_or_else(|| AppError::AuditNotFound(audit_id.to_string()))?;
    if audit.status != AuditStatus::Completed {
        return Err(AppError::AuditIncomplete.into());
    }

    let reports = ReportRepository::new(state.pool.clone());
    if let Some(existing) = reports.find_for_audit(audit_id, format.as_str()).await? {
        if tokio::fs::try_exists(&existing.file_path).await.unwrap_or(false) {
            return Ok(Json(json!({
                "report_id": existing.id,
                "file_path": existing.file_path,
                "created_at": existing.created_at.to_rfc3339(),
                "download_count": existing.download_count,
            }))
            .into_response());
        }
    }

    let websites = WebsiteRepository::new(state.pool.clone());
    let website = websites
        .get_by_id(audit.website_id)
        .await?
        .ok_or(AppError::WebsiteNotFound(audit.website_id))?;

    let details = DetailRepository::new(state.pool.clone());
    let metrics = MetricsRepository::new(state.pool.clone());
    let scans = SecurityRepository::new(state.pool.clone());
    let data = ReportData {
        audit: audit.clone(),
        domain: website.domain.clone(),
        website_title: website.title.clone(),
        details: details.list_for_audit(audit_id).await?,
        seo_metrics: metrics.get_seo(audit_id).await?,
        performance: metrics.get_performance(audit_id).await?,
        security: scans.get_for_audit(audit_id).await?.map(|(_, scan)| scan),
    };
    let branding = state.white_label.get().await;

    let generator = ReportGenerator::new(&state.config.reports_dir);
    let (path, file_size_kb) = generator.render(&data, format, &branding).await?;
    let row = reports
        .create(
            &audit.id,
            format.as_str(),
            &path.to_string_lossy(),
            file_size_kb,
            None,
        )
        .await?;
    tracing::info!(audit_id = %audit.id, report_type = format.as_str(), "report rendered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "report_id": row.id,
            "file_path": row.file_path,
            "file_size_kb": row.file_size_kb,
            "created_at": row.created_at.to_rfc3339(),
        })),
    )
        .into_response())
}

/// GET /api/reports
async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let (page, per_page) = params.window();
    let reports = ReportRepository::new(state.pool.clone());
    let (items, total) = reports.list(page, per_page).await?;

    Ok(Json(json!({
        "reports": items,
        "pagination": Pagination::new(page, per_page, total),
    })))
}

/// GET /api/reports/{report_id}/download
async fn download(
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
) -> Result<Response, ApiError> {
    let reports = ReportRepository::new(state.pool.clone());
    let report = reports.get_by_id(report_id).await?.ok_or(AppError::NotFound {
        entity: "Report",
        id: report_id,
    })?;

    let contents = tokio::fs::read(&report.file_path)
        .await
        .map_err(|_| AppError::Missing("Report file not found"))?;
    reports.increment_download(report.id).await?;

    let audits = AuditRepository::new(state.pool.clone());
    let websites = WebsiteRepository::new(state.pool.clone());
    let audit = audits
        .get_by_id(&report.audit_id)
        .await?
        .ok_or_else(|| AppError::AuditNotFound(report.audit_id.clone()))?;
    let website = websites
        .get_by_id(audit.website_id)
        .await?
        .ok_or(AppError::WebsiteNotFound(audit.website_id))?;
    let format = ReportFormat::parse(&report.report_type)
        .ok_or_else(|| AppError::database("Unknown report type on stored report"))?;
    let filename = report_filename(&website.domain, &audit.id, format);

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        contents,
    )
        .into_response())
}

/// DELETE /api/reports/{report_id}
///
/// Removes the file first, then the row. A file already gone is not an
/// error.
async fn delete_report(
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let reports = ReportRepository::new(state.pool.clone());
    let report = reports.get_by_id(report_id).await?.ok_or(AppError::NotFound {
        entity: "Report",
        id: report_id,
    })?;

    match tokio::fs::remove_file(&report.file_path).await {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => {
            return Err(AppError::Other(
                anyhow::Error::new(error).context("Failed to delete report file"),
            )
            .into())
        }
    }
    reports.delete(report.id).await?;

    Ok(Json(json!({
        "message": "Report deleted successfully",
    })))
}
