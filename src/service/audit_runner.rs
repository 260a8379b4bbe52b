//! Full-audit orchestration: fetch the page, score it, persist every row,
//! and shape the API payloads.

use serde_json::{json, Map, Value};
use sqlx::SqlitePool;
use url::Url;

use crate::cache::AnalysisCache;
use crate::domain::models::{
    Audit, AuditDetail, PerformanceMetrics, SecurityScan, SeoMetrics, Website,
};
use crate::error::{AppError, Result};
use crate::extractor::page::{url_authority, PageDocument};
use crate::repository::sqlite::{
    AuditRepository, DetailRepository, MetricsRepository, SecurityRepository, WebsiteRepository,
};
use crate::service::analyzer::{PageAnalysis, PageAnalyzer};
use crate::service::fetcher::PageFetcher;
use crate::service::probes::ResourceProbe;

/// Accepts bare hostnames by defaulting the scheme to https, then requires an
/// http(s) URL with a host.
pub fn normalize_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("URL is required"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|_| AppError::InvalidUrl(candidate.clone()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::InvalidUrl(candidate));
    }
    Ok(url)
}

/// Runs complete audits and assembles the audit API responses.
pub struct AuditRunner {
    websites: WebsiteRepository,
    audits: AuditRepository,
    details: DetailRepository,
    metrics: MetricsRepository,
    security: SecurityRepository,
    fetcher: PageFetcher,
    probe: ResourceProbe,
    cache: AnalysisCache,
}

impl AuditRunner {
    pub fn new(pool: SqlitePool, cache: AnalysisCache) -> anyhow::Result<Self> {
        Ok(Self {
            websites: WebsiteRepository::new(pool.clone()),
            audits: AuditRepository::new(pool.clone()),
            details: DetailRepository::new(pool.clone()),
            metrics: MetricsRepository::new(pool.clone()),
            security: SecurityRepository::new(pool),
            fetcher: PageFetcher::new()?,
            probe: ResourceProbe::new()?,
            cache,
        })
    }

    /// Runs the full pipeline for one URL.
    ///
    /// A cached result short-circuits everything after the website upsert
    /// unless `force` is set. On analysis failure the audit row is marked
    /// `failed` with the message and the error propagates to the caller.
    pub async fn analyze(
        &self,
        raw_url: &str,
        force: bool,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<Value> {
        let url = normalize_url(raw_url)?;
        let domain = url_authority(&url)
            .map(|a| a.to_ascii_lowercase())
            .ok_or_else(|| AppError::InvalidUrl(url.to_string()))?;

        let website = self.websites.upsert(&domain).await?;

        if !force {
            if let Some(mut cached) = self.cache.get_analysis(&domain) {
                if let Some(map) = cached.as_object_mut() {
                    map.insert("cached".to_string(), json!(true));
                }
                tracing::debug!(domain, "served analysis from cache");
                return Ok(cached);
            }
        }

        let audit = self
            .audits
            .create(website.id, url.as_str(), user_agent, ip_address)
            .await?;

        let analysis = match self.run_analysis(&url).await {
            Ok(analysis) => analysis,
            Err(err) => {
                let message = err.to_string();
                self.audits.fail(&audit.id, &message).await?;
                tracing::warn!(audit_id = %audit.id, error = %message, "audit failed");
                return Err(err);
            }
        };

        let detail_rows = detail_rows(&audit.id, &analysis);
        self.details.insert_batch(&detail_rows).await?;

        let mut seo = analysis.seo_metrics.clone();
        seo.audit_id = audit.id.clone();
        self.metrics.save_seo(&seo).await?;

        let mut performance = analysis.performance.clone();
        performance.audit_id = audit.id.clone();
        self.metrics.save_performance(&performance).await?;

        let mut security = analysis.security.clone();
        security.audit_id = audit.id.clone();
        self.security.save(&security).await?;

        self.audits
            .complete(&audit.id, analysis.overall_score)
            .await?;
        self.websites
            .record_audit_outcome(
                website.id,
                seo.page_title.as_deref(),
                seo.meta_description.as_deref(),
            )
            .await?;

        tracing::info!(
            audit_id = %audit.id,
            domain,
            score = analysis.overall_score,
            "audit completed"
        );

        let response = analysis_response(&audit, &website, &analysis, &detail_rows);
        self.cache.store_analysis(&domain, response.clone());
        Ok(response)
    }

    /// Stored audit with its website, grouped details, and metric rows.
    pub async fn audit_report(&self, audit_id: &str) -> Result<Value> {
        let audit = self
            .audits
            .get_by_id(audit_id)
            .await?
            .ok_or_else(|| AppError::AuditNotFound(audit_id.to_string()))?;
        let website = self
            .websites
            .get_by_id(audit.website_id)
            .await?
            .ok_or(AppError::WebsiteNotFound(audit.website_id))?;

        let details = self.details.list_for_audit(&audit.id).await?;
        let seo = self.metrics.get_seo(&audit.id).await?;
        let performance = self.metrics.get_performance(&audit.id).await?;
        let security = self.security.get_for_audit(&audit.id).await?;

        Ok(json!({
            "id": audit.id,
            "website": { "id": website.id, "domain": website.domain },
            "url": audit.url,
            "audit_type": audit.audit_type,
            "status": audit.status.as_str(),
            "overall_score": audit.overall_score,
            "started_at": audit.started_at.to_rfc3339(),
            "completed_at": audit.completed_at.map(|t| t.to_rfc3339()),
            "error_message": audit.error_message,
            "details": grouped_details(&details),
            "seo_metrics": seo.map(|m| seo_metrics_json(&m)),
            "performance_metrics": performance.map(|m| performance_json(&m)),
            "security_scan": security.map(|(_, scan)| security_json(&scan)),
        }))
    }

    async fn run_analysis(&self, url: &Url) -> Result<PageAnalysis> {
        let fetched = self.fetcher.fetch(url).await?;
        let page = PageDocument::parse(&fetched.body);
        let probes = self.probe.run(url).await;
        Ok(PageAnalyzer::analyze(url, &fetched, &page, &probes))
    }
}

fn detail_rows(audit_id: &str, analysis: &PageAnalysis) -> Vec<AuditDetail> {
    analysis
        .checks
        .iter()
        .map(|check| AuditDetail {
            audit_id: audit_id.to_string(),
            category: check.category.to_string(),
            check_name: check.check_name.to_string(),
            status: check.status,
            score: check.score,
            max_score: check.max_score,
            message: check.message.clone(),
            recommendation: check.recommendation.clone(),
            technical_details: None,
            priority: check.priority,
        })
        .collect()
}

fn analysis_response(
    audit: &Audit,
    website: &Website,
    analysis: &PageAnalysis,
    details: &[AuditDetail],
) -> Value {
    json!({
        "audit_id": audit.id,
        "website_id": website.id,
        "url": analysis.url,
        "domain": analysis.domain,
        "status": "completed",
        "overall_score": analysis.overall_score,
        "page_title": analysis.seo_metrics.page_title,
        "meta_description": analysis.seo_metrics.meta_description,
        "details": grouped_details(details),
        "seo_metrics": seo_metrics_json(&analysis.seo_metrics),
        "performance_metrics": performance_json(&analysis.performance),
        "security_scan": security_json(&analysis.security),
        "cached": false,
    })
}

/// `{category: {check_name: verdict}}`, the shape every consumer of audit
/// details expects.
pub fn grouped_details(details: &[AuditDetail]) -> Value {
    let mut groups = Map::new();
    for detail in details {
        let entry = groups
            .entry(detail.category.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(checks) = entry.as_object_mut() {
            checks.insert(
                detail.check_name.clone(),
                json!({
                    "status": detail.status.as_str(),
                    "score": detail.score,
                    "max_score": detail.max_score,
                    "message": detail.message,
                    "recommendation": detail.recommendation,
                    "priority": detail.priority.as_str(),
                }),
            );
        }
    }
    Value::Object(groups)
}

pub fn seo_metrics_json(metrics: &SeoMetrics) -> Value {
    json!({
        "page_title": metrics.page_title,
        "meta_description": metrics.meta_description,
        "h1_tags": metrics.h1_tags,
        "h2_tags": metrics.h2_tags,
        "h3_tags": metrics.h3_tags,
        "images_count": metrics.images_count,
        "images_without_alt": metrics.images_without_alt,
        "internal_links": metrics.internal_links,
        "external_links": metrics.external_links,
        "word_count": metrics.word_count,
        "page_size_kb": metrics.page_size_kb,
        "load_time_ms": metrics.load_time_ms,
        "mobile_friendly": metrics.mobile_friendly,
        "ssl_enabled": metrics.ssl_enabled,
        "robots_txt_exists": metrics.robots_txt_exists,
        "sitemap_exists": metrics.sitemap_exists,
        "canonical_url": metrics.canonical_url,
        "schema_markup": metrics.schema_markup,
        "social_tags": metrics.social_tags,
    })
}

pub fn performance_json(metrics: &PerformanceMetrics) -> Value {
    json!({
        "first_contentful_paint": metrics.first_contentful_paint,
        "largest_contentful_paint": metrics.largest_contentful_paint,
        "first_input_delay": metrics.first_input_delay,
        "cumulative_layout_shift": metrics.cumulative_layout_shift,
        "speed_index": metrics.speed_index,
        "time_to_interactive": metrics.time_to_interactive,
        "total_blocking_time": metrics.total_blocking_time,
        "performance_score": metrics.performance_score,
        "accessibility_score": metrics.accessibility_score,
        "best_practices_score": metrics.best_practices_score,
        "seo_score": metrics.seo_score,
    })
}

pub fn security_json(scan: &SecurityScan) -> Value {
    json!({
        "ssl_certificate": scan.ssl_certificate,
        "ssl_grade": scan.ssl_grade,
        "ssl_expires_at": scan.ssl_expires_at.map(|t| t.to_rfc3339()),
        "malware_detected": scan.malware_detected,
        "blacklist_status": scan.blacklist_status,
        "security_headers": scan.security_headers,
        "vulnerabilities": scan.vulnerabilities,
        "security_score": scan.security_score,
    })
}
