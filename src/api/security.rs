//! Security analysis endpoints: the combined scan, the standalone section
//! probes, and reads over persisted scans.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Map, Value};
use url::Url;

use super::{json_body, AppState};
use crate::error::{ApiError, AppError};
use crate::repository::sqlite::{
    AuditRepository, SecurityRepository, SecurityStatistics, WebsiteRepository,
};
use crate::service::audit_runner::normalize_url;
use crate::service::security::{scan_record, stored_scan_recommendations};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/security/analyze", post(analyze))
        .route("/security/ssl-check", post(ssl_check))
        .route("/security/headers-check", post(headers_check))
        .route("/security/malware-scan", post(malware_scan))
        .route("/security/vulnerability-scan", post(vulnerability_scan))
        .route("/security/privacy-analysis", post(privacy_analysis))
        .route("/security/audit/{audit_id}", get(audit_scan))
        .route("/security/statistics", get(statistics))
        .route("/security/recommendations/{audit_id}", get(recommendations))
}

fn required_url(body: &Value) -> Result<Url, AppError> {
    let raw = body
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::validation("URL is required"))?;
    normalize_url(raw)
}

/// Standalone probe payload: the echoed URL, one section, and a timestamp.
fn section_payload(url: &Url, key: &'static str, section: Value) -> Value {
    let mut payload = Map::new();
    payload.insert("url".to_string(), json!(url.as_str()));
    payload.insert(key.to_string(), section);
    payload.insert(
        "analysis_date".to_string(),
        json!(Utc::now().to_rfc3339()),
    );
    Value::Object(payload)
}

/// POST /api/security/analyze
async fn analyze(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let body = json_body(body);
    let url = required_url(&body)?;
    let domain = crate::extractor::page::url_authority(&url)
        .ok_or_else(|| AppError::InvalidUrl(url.to_string()))?
        .to_lowercase();

    let websites = WebsiteRepository::new(state.pool.clone());
    websites.upsert(&domain).await?;

    let analysis = state.security.analyze(&url).await;

    if let Some(audit_id) = body.get("audit_id").and_then(Value::as_str) {
        let audits = AuditRepository::new(state.pool.clone());
        if audits.get_by_id(audit_id).await?.is_some() {
            let scans = SecurityRepository::new(state.pool.clone());
            scans.save(&scan_record(audit_id, &analysis)).await?;
        }
    }

    Ok(Json(analysis))
}

/// POST /api/security/ssl-check
async fn ssl_check(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let url = required_url(&json_body(body))?;
    let section = state.security.ssl_check(&url).await;
    Ok(Json(section_payload(&url, "ssl_analysis", section)))
}

/// POST /api/security/headers-check
async fn headers_check(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let url = required_url(&json_body(body))?;
    let section = state.security.headers_check(&url).await;
    Ok(Json(section_payload(&url, "security_headers", section)))
}

/// POST /api/security/malware-scan
async fn malware_scan(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let url = required_url(&json_body(body))?;
    let section = state.security.malware_scan(&url).await;
    Ok(Json(section_payload(&url, "malware_scan", section)))
}

/// POST /api/security/vulnerability-scan
async fn vulnerability_scan(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let url = required_url(&json_body(body))?;
    let section = state.security.vulnerability_scan(&url).await;
    Ok(Json(section_payload(&url, "vulnerability_scan", section)))
}

/// POST /api/security/privacy-analysis
async fn privacy_analysis(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let url = required_url(&json_body(body))?;
    let section = state.security.privacy_analysis(&url).await;
    Ok(Json(section_payload(&url, "privacy_analysis", section)))
}

/// GET /api/security/audit/{audit_id}
async fn audit_scan(
    State(state): State<AppState>,
    Path(audit_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let audits = AuditRepository::new(state.pool.clone());
    let websites = WebsiteRepository::new(state.pool.clone());
    let scans = SecurityRepository::new(state.pool.clone());

    let audit = audits
        .get_by_id(&audit_id)
        .await?
        .ok_or(AppError::AuditNotFound(audit_id))?;
    let (scan_id, scan) = scans
        .get_for_audit(&audit.id)
        .await?
        .ok_or(AppError::Missing("No security scan found for this audit"))?;
    let website = websites
        .get_by_id(audit.website_id)
        .await?
        .ok_or(AppError::WebsiteNotFound(audit.website_id))?;

    Ok(Json(json!({
        "audit_id": audit.id,
        "website": {
            "id": website.id,
            "domain": website.domain,
            "url": audit.url,
        },
        "security_scan": {
            "id": scan_id,
            "ssl_certificate": scan.ssl_certificate,
            "ssl_grade": scan.ssl_grade,
            "ssl_expires_at": scan.ssl_expires_at.map(|at| at.to_rfc3339()),
            "malware_detected": scan.malware_detected,
            "blacklist_status": scan.blacklist_status,
            "security_headers": scan.security_headers,
            "vulnerabilities": scan.vulnerabilities,
            "security_score": scan.security_score,
            "scan_timestamp": scan.scan_timestamp.to_rfc3339(),
        },
    })))
}

/// GET /api/security/statistics
async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<SecurityStatistics>, ApiError> {
    let scans = SecurityRepository::new(state.pool.clone());
    Ok(Json(scans.statistics().await?))
}

/// GET /api/security/recommendations/{audit_id}
async fn recommendations(
    State(state): State<AppState>,
    Path(audit_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let audits = AuditRepository::new(state.pool.clone());
    let websites = WebsiteRepository::new(state.pool.clone());
    let scans = SecurityRepository::new(state.pool.clone());

    let audit = audits
        .get_by_id(&audit_id)
        .await?
        .ok_or(AppError::AuditNotFound(audit_id))?;
    let (_, scan) = scans
        .get_for_audit(&audit.id)
        .await?
        .ok_or(AppError::Missing("No security scan found for this audit"))?;
    let website = websites
        .get_by_id(audit.website_id)
        .await?
        .ok_or(AppError::WebsiteNotFound(audit.website_id))?;

    let recommendations = stored_scan_recommendations(&scan);

    Ok(Json(json!({
        "audit_id": audit.id,
        "website": {
            "id": website.id,
            "domain": website.domain,
        },
        "security_score": scan.security_score,
        "total_recommendations": recommendations.len(),
        "recommendations": recommendations,
    })))
}
