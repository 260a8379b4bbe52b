//! Report rendering: turns a completed audit's stored rows into an HTML or
//! JSON file under the reports directory.

use std::path::PathBuf;

use anyhow::Context;
use serde_json::{json, Value};

use crate::domain::models::{
    Audit, AuditDetail, CheckStatus, PerformanceMetrics, Priority, SecurityScan, SeoMetrics,
};
use crate::service::white_label::{self, WhiteLabelConfig};

/// Rendered file formats. PDF styling is deliberately not offered; the HTML
/// report prints cleanly instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Html,
    Json,
}

impl ReportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "html" => Some(ReportFormat::Html),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Html => "text/html; charset=utf-8",
            ReportFormat::Json => "application/json",
        }
    }
}

/// Everything a report pulls from storage for one audit.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub audit: Audit,
    pub domain: String,
    pub website_title: Option<String>,
    pub details: Vec<AuditDetail>,
    pub seo_metrics: Option<SeoMetrics>,
    pub performance: Option<PerformanceMetrics>,
    pub security: Option<SecurityScan>,
}

pub fn report_filename(domain: &str, audit_id: &str, format: ReportFormat) -> String {
    format!("seo_report_{}_{}.{}", domain, audit_id, format.as_str())
}

pub struct ReportGenerator {
    reports_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Renders the report to disk and returns the file path with its size
    /// in whole kilobytes.
    pub async fn render(
        &self,
        data: &ReportData,
        format: ReportFormat,
        branding: &WhiteLabelConfig,
    ) -> anyhow::Result<(PathBuf, i64)> {
        let contents = match format {
            ReportFormat::Html => render_html(data, branding),
            ReportFormat::Json => {
                serde_json::to_string_pretty(&report_json(data))
                    .context("Failed to serialize report")?
            }
        };

        tokio::fs::create_dir_all(&self.reports_dir)
            .await
            .context("Failed to create reports directory")?;

        let path = self
            .reports_dir
            .join(report_filename(&data.domain, &data.audit.id, format));
        tokio::fs::write(&path, contents.as_bytes())
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        let file_size_kb = (contents.len() / 1024) as i64;
        tracing::info!(
            audit_id = %data.audit.id,
            format = format.as_str(),
            file_size_kb,
            "rendered report"
        );

        Ok((path, file_size_kb))
    }
}

pub fn score_interpretation(score: i64) -> &'static str {
    if score >= 90 {
        "Excellent SEO performance with minimal issues to address."
    } else if score >= 80 {
        "Good SEO performance with some room for improvement."
    } else if score >= 60 {
        "Average SEO performance with several areas needing attention."
    } else if score >= 40 {
        "Below average SEO performance requiring significant improvements."
    } else {
        "Poor SEO performance needing immediate attention across multiple areas."
    }
}

/// The raw dump handed back for `json` reports, shaped like the stored rows.
pub fn report_json(data: &ReportData) -> Value {
    let details: Vec<Value> = data
        .details
        .iter()
        .map(|detail| {
            json!({
                "category": detail.category,
                "check_name": detail.check_name,
                "status": detail.status.as_str(),
                "score": detail.score,
                "max_score": detail.max_score,
                "message": detail.message,
                "recommendation": detail.recommendation,
                "priority": detail.priority.as_str(),
            })
        })
        .collect();

    let seo_metrics = data.seo_metrics.as_ref().map(|seo| {
        json!({
            "page_title": seo.page_title,
            "meta_description": seo.meta_description,
            "h1_tags": seo.h1_tags,
            "images_count": seo.images_count,
            "images_without_alt": seo.images_without_alt,
            "internal_links": seo.internal_links,
            "external_links": seo.external_links,
            "word_count": seo.word_count,
            "mobile_friendly": seo.mobile_friendly,
            "ssl_enabled": seo.ssl_enabled,
        })
    });

    let performance_metrics = data.performance.as_ref().map(|perf| {
        json!({
            "performance_score": perf.performance_score,
            "accessibility_score": perf.accessibility_score,
            "best_practices_score": perf.best_practices_score,
            "seo_score": perf.seo_score,
            "first_contentful_paint": perf.first_contentful_paint,
            "largest_contentful_paint": perf.largest_contentful_paint,
            "speed_index": perf.speed_index,
        })
    });

    let security_scan = data.security.as_ref().map(|scan| {
        json!({
            "ssl_grade": scan.ssl_grade,
            "malware_detected": scan.malware_detected,
            "security_score": scan.security_score,
        })
    });

    json!({
        "audit": {
            "id": data.audit.id,
            "url": data.audit.url,
            "domain": data.domain,
            "overall_score": data.audit.overall_score,
            "completed_at": data.audit.completed_at.map(|at| at.to_rfc3339()),
            "website_title": data.website_title,
        },
        "details": details,
        "seo_metrics": seo_metrics,
        "performance_metrics": performance_metrics,
        "security_scan": security_scan,
    })
}

/// The branded HTML report. The branding placeholders are filled from the
/// stored white-label config; an unset company name falls back to the
/// product default.
fn render_html(data: &ReportData, branding: &WhiteLabelConfig) -> String {
    let mut config = branding.clone();
    if config.company_name.trim().is_empty() {
        config.company_name = "SEO Analyzer Pro".to_string();
    }

    let template = html_template(data);
    white_label::apply_branding(&template, &config)
}

fn html_template(data: &ReportData) -> String {
    let score = data.audit.overall_score.unwrap_or(0);
    let analysis_date = data
        .audit
        .completed_at
        .unwrap_or(data.audit.started_at)
        .format("%B %d, %Y");

    let mut out = String::with_capacity(16 * 1024);
    out.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>SEO Analysis Report - {domain}</title>
<style>
{{{{CUSTOM_CSS}}}}
body {{ font-family: var(--font-family); margin: 0; color: #2c3e50; }}
header {{ background: var(--primary-color); color: #fff; padding: 24px 40px; }}
header h2 {{ font-weight: normal; margin: 4px 0 0; }}
section {{ padding: 16px 40px; }}
h2.section-title {{ color: var(--secondary-color); border-bottom: 2px solid var(--accent-color); padding-bottom: 4px; }}
.score {{ font-size: 48px; color: var(--primary-color); font-weight: bold; }}
table {{ border-collapse: collapse; width: 100%; margin: 12px 0; }}
th {{ background: var(--secondary-color); color: #fff; text-align: left; padding: 6px 10px; }}
td {{ border: 1px solid #ccc; padding: 6px 10px; }}
footer {{ background: #ecf0f1; padding: 16px 40px; font-size: 13px; color: #7f8c8d; }}
</style>
</head>
<body>
<header>
<h1>{{{{COMPANY_NAME}}}}</h1>
<h2>SEO Analysis Report</h2>
</header>
<section>
<p><strong>Website:</strong> {domain}</p>
<p><strong>URL:</strong> {url}</p>
<p><strong>Analysis Date:</strong> {analysis_date}</p>
<p><strong>Overall SEO Score</strong></p>
<p class="score">{score}/100</p>
<p>{interpretation}</p>
<p>Report ID: {audit_id}</p>
</section>
"#,
        domain = escape(&data.domain),
        url = escape(&data.audit.url),
        audit_id = escape(&data.audit.id),
        interpretation = score_interpretation(score),
    ));

    push_executive_summary(&mut out, data, score);
    push_detailed_analysis(&mut out, data);
    push_recommendations(&mut out, data);
    push_technical_details(&mut out, data);

    out.push_str(
        r#"<footer>
<p>{{FOOTER_TEXT}}</p>
<p>{{POWERED_BY}}</p>
</footer>
</body>
</html>
"#,
    );

    out
}

fn push_executive_summary(out: &mut String, data: &ReportData, score: i64) {
    out.push_str("<section>\n<h2 class=\"section-title\">Executive Summary</h2>\n");
    out.push_str(&format!(
        "<p>This report provides a comprehensive SEO analysis of {}. The website received \
         an overall SEO score of {}/100, indicating {}</p>\n",
        escape(&data.domain),
        score,
        score_interpretation(score).to_lowercase()
    ));
    out.push_str(
        "<p>Our analysis examined SEO factors across multiple categories including on-page \
         optimization, technical SEO, content quality, performance, and mobile-friendliness.</p>\n",
    );

    if let Some(seo) = &data.seo_metrics {
        let title_status = match &seo.page_title {
            Some(title) if title.chars().count() <= 60 => ("Present".to_string(), "✓"),
            Some(_) => ("Too long".to_string(), "⚠"),
            None => ("Missing".to_string(), "⚠"),
        };

        out.push_str("<h3>Key Metrics Overview</h3>\n<table>\n");
        out.push_str("<tr><th>Metric</th><th>Value</th><th>Status</th></tr>\n");
        push_row(out, "Page Title", &title_status.0, title_status.1);
        push_row(
            out,
            "Meta Description",
            if seo.meta_description.is_some() { "Present" } else { "Missing" },
            if seo.meta_description.is_some() { "✓" } else { "✗" },
        );
        push_row(
            out,
            "SSL Certificate",
            if seo.ssl_enabled { "Enabled" } else { "Disabled" },
            if seo.ssl_enabled { "✓" } else { "✗" },
        );
        push_row(
            out,
            "Mobile Friendly",
            if seo.mobile_friendly { "Yes" } else { "No" },
            if seo.mobile_friendly { "✓" } else { "✗" },
        );
        push_row(
            out,
            "Page Load Time",
            &format!("{}ms", seo.load_time_ms),
            if seo.load_time_ms < 3000 { "✓" } else { "⚠" },
        );
        out.push_str("</table>\n");
    }
    out.push_str("</section>\n");
}

fn push_detailed_analysis(out: &mut String, data: &ReportData) {
    out.push_str("<section>\n<h2 class=\"section-title\">Detailed Analysis</h2>\n");

    for (category, checks) in group_by_category(&data.details) {
        out.push_str(&format!("<h3>{}</h3>\n<table>\n", title_case(category)));
        out.push_str("<tr><th>Check</th><th>Status</th><th>Score</th><th>Message</th></tr>\n");
        for check in checks {
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}/{}</td><td>{}</td></tr>\n",
                title_case(&check.check_name),
                status_symbol(check.status),
                check.score,
                check.max_score,
                escape(&truncate(&check.message, 60)),
            ));
        }
        out.push_str("</table>\n");
    }
    out.push_str("</section>\n");
}

fn push_recommendations(out: &mut String, data: &ReportData) {
    out.push_str("<section>\n<h2 class=\"section-title\">Recommendations</h2>\n");

    let mut actionable: Vec<&AuditDetail> = data
        .details
        .iter()
        .filter(|detail| {
            detail.recommendation.is_some()
                && matches!(detail.status, CheckStatus::Fail | CheckStatus::Warning)
        })
        .collect();
    actionable.sort_by_key(|detail| priority_rank(detail.priority));

    if actionable.is_empty() {
        out.push_str("<p>Great job! No critical issues were found.</p>\n");
    } else {
        let mut current: Option<Priority> = None;
        for detail in actionable {
            if current != Some(detail.priority) {
                current = Some(detail.priority);
                out.push_str(&format!(
                    "<h3>{} Priority Issues</h3>\n",
                    title_case(detail.priority.as_str())
                ));
            }
            let recommendation = detail.recommendation.as_deref().unwrap_or("");
            out.push_str(&format!(
                "<p><strong>{} ({}):</strong> {}</p>\n",
                title_case(&detail.check_name),
                title_case(&detail.category),
                escape(recommendation),
            ));
        }
    }
    out.push_str("</section>\n");
}

fn push_technical_details(out: &mut String, data: &ReportData) {
    out.push_str("<section>\n<h2 class=\"section-title\">Technical Details</h2>\n");

    if let Some(seo) = &data.seo_metrics {
        out.push_str("<h3>SEO Metrics</h3>\n<table>\n");
        out.push_str("<tr><th>Metric</th><th>Value</th></tr>\n");
        push_pair(out, "Page Title", seo.page_title.as_deref().unwrap_or("Not found"));
        push_pair(
            out,
            "Meta Description",
            seo.meta_description.as_deref().unwrap_or("Not found"),
        );
        push_pair(out, "H1 Tags", &seo.h1_tags.len().to_string());
        push_pair(out, "Images Count", &seo.images_count.to_string());
        push_pair(out, "Images without Alt", &seo.images_without_alt.to_string());
        push_pair(out, "Internal Links", &seo.internal_links.to_string());
        push_pair(out, "External Links", &seo.external_links.to_string());
        push_pair(out, "Word Count", &seo.word_count.to_string());
        push_pair(out, "Page Size", &format!("{:.1} KB", seo.page_size_kb));
        push_pair(out, "Load Time", &format!("{} ms", seo.load_time_ms));
        out.push_str("</table>\n");
    }

    if let Some(perf) = &data.performance {
        out.push_str("<h3>Performance Metrics</h3>\n<table>\n");
        out.push_str("<tr><th>Metric</th><th>Score</th></tr>\n");
        push_pair(out, "Performance Score", &format!("{}/100", perf.performance_score));
        push_pair(
            out,
            "Accessibility Score",
            &format!("{}/100", perf.accessibility_score),
        );
        push_pair(
            out,
            "Best Practices Score",
            &format!("{}/100", perf.best_practices_score),
        );
        push_pair(out, "SEO Score", &format!("{}/100", perf.seo_score));
        out.push_str("</table>\n");
    }

    if let Some(scan) = &data.security {
        out.push_str("<h3>Security Analysis</h3>\n<table>\n");
        out.push_str("<tr><th>Security Aspect</th><th>Status</th></tr>\n");
        push_pair(out, "SSL Grade", scan.ssl_grade.as_deref().unwrap_or("Unknown"));
        push_pair(
            out,
            "Malware Detected",
            if scan.malware_detected { "Yes" } else { "No" },
        );
        push_pair(out, "Security Score", &format!("{}/100", scan.security_score));
        out.push_str("</table>\n");
    }
    out.push_str("</section>\n");
}

fn push_row(out: &mut String, metric: &str, value: &str, status: &str) {
    out.push_str(&format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        metric,
        escape(value),
        status
    ));
}

fn push_pair(out: &mut String, metric: &str, value: &str) {
    out.push_str(&format!(
        "<tr><td>{}</td><td>{}</td></tr>\n",
        metric,
        escape(value)
    ));
}

/// Categories in first-appearance order, each with its checks in row order.
fn group_by_category(details: &[AuditDetail]) -> Vec<(&str, Vec<&AuditDetail>)> {
    let mut grouped: Vec<(&str, Vec<&AuditDetail>)> = Vec::new();
    for detail in details {
        match grouped.iter_mut().find(|(name, _)| *name == detail.category) {
            Some((_, checks)) => checks.push(detail),
            None => grouped.push((detail.category.as_str(), vec![detail])),
        }
    }
    grouped
}

fn priority_rank(priority: Priority) -> u8 {
    match priority {
        Priority::Critical => 0,
        Priority::High => 1,
        Priority::Medium => 2,
        Priority::Low => 3,
    }
}

fn status_symbol(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "✓",
        CheckStatus::Fail => "✗",
        CheckStatus::Warning => "⚠",
        CheckStatus::Info => "ℹ",
    }
}

fn title_case(text: &str) -> String {
    text.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(message: &str, limit: usize) -> String {
    if message.chars().count() > limit {
        let cut: String = message.chars().take(limit - 3).collect();
        format!("{cut}...")
    } else {
        message.to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::AuditStatus;
    use chrono::Utc;

    fn audit(id: &str, score: Option<i64>) -> Audit {
        Audit {
            id: id.to_string(),
            website_id: 1,
            url: "https://example.com/".to_string(),
            audit_type: "full".to_string(),
            overall_score: score,
            status: AuditStatus::Completed,
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
            error_message: None,
            user_agent: None,
            ip_address: None,
            is_public: false,
        }
    }

    fn detail(
        category: &str,
        check_name: &str,
        status: CheckStatus,
        priority: Priority,
        recommendation: Option<&str>,
    ) -> AuditDetail {
        AuditDetail {
            audit_id: "a1".to_string(),
            category: category.to_string(),
            check_name: check_name.to_string(),
            status,
            score: 5,
            max_score: 10,
            message: "checked".to_string(),
            recommendation: recommendation.map(str::to_string),
            technical_details: None,
            priority,
        }
    }

    fn seo(audit_id: &str) -> SeoMetrics {
        SeoMetrics {
            audit_id: audit_id.to_string(),
            page_title: Some("Example".to_string()),
            meta_description: None,
            h1_tags: vec!["Welcome".to_string()],
            h2_tags: vec![],
            h3_tags: vec![],
            images_count: 3,
            images_without_alt: 1,
            internal_links: 10,
            external_links: 2,
            word_count: 500,
            page_size_kb: 22.6,
            load_time_ms: 800,
            mobile_friendly: true,
            ssl_enabled: true,
            robots_txt_exists: true,
            sitemap_exists: true,
            canonical_url: None,
            schema_markup: serde_json::json!({}),
            social_tags: serde_json::json!({}),
        }
    }

    fn data(details: Vec<AuditDetail>) -> ReportData {
        ReportData {
            audit: audit("a1", Some(85)),
            domain: "example.com".to_string(),
            website_title: Some("Example".to_string()),
            details,
            seo_metrics: Some(seo("a1")),
            performance: None,
            security: None,
        }
    }

    #[test]
    fn interpretation_tiers() {
        assert!(score_interpretation(95).starts_with("Excellent"));
        assert!(score_interpretation(85).starts_with("Good"));
        assert!(score_interpretation(70).starts_with("Average"));
        assert!(score_interpretation(50).starts_with("Below average"));
        assert!(score_interpretation(20).starts_with("Poor"));
    }

    #[test]
    fn json_report_mirrors_stored_rows() {
        let report = report_json(&data(vec![detail(
            "seo",
            "title_tag",
            CheckStatus::Pass,
            Priority::Low,
            None,
        )]));

        assert_eq!(report["audit"]["id"], "a1");
        assert_eq!(report["audit"]["domain"], "example.com");
        assert_eq!(report["audit"]["overall_score"], 85);
        assert_eq!(report["details"][0]["check_name"], "title_tag");
        assert_eq!(report["details"][0]["status"], "pass");
        assert_eq!(report["seo_metrics"]["word_count"], 500);
        assert_eq!(report["performance_metrics"], serde_json::Value::Null);
        assert_eq!(report["security_scan"], serde_json::Value::Null);
    }

    #[test]
    fn html_carries_summary_and_branding_fallback() {
        let html = render_html(
            &data(vec![detail(
                "seo",
                "meta_description",
                CheckStatus::Fail,
                Priority::High,
                Some("Add a meta description"),
            )]),
            &WhiteLabelConfig::default(),
        );

        assert!(html.contains("SEO Analyzer Pro"));
        assert!(html.contains("Powered by SEO Analyzer Pro"));
        assert!(html.contains("85/100"));
        assert!(html.contains("Good SEO performance"));
        assert!(html.contains("High Priority Issues"));
        assert!(html.contains("<strong>Meta Description (Seo):</strong> Add a meta description"));
        assert!(html.contains("--primary-color: #3b82f6;"));
        assert!(!html.contains("{{COMPANY_NAME}}"));
    }

    #[test]
    fn html_without_actionable_checks_celebrates() {
        let html = render_html(
            &data(vec![detail(
                "seo",
                "title_tag",
                CheckStatus::Pass,
                Priority::Low,
                Some("ignored because the check passed"),
            )]),
            &WhiteLabelConfig::default(),
        );

        assert!(html.contains("Great job! No critical issues were found."));
    }

    #[test]
    fn recommendations_group_by_priority_order() {
        let html = render_html(
            &data(vec![
                detail("content", "word_count", CheckStatus::Warning, Priority::Medium, Some("More copy")),
                detail("seo", "title_tag", CheckStatus::Fail, Priority::Critical, Some("Add a title")),
            ]),
            &WhiteLabelConfig::default(),
        );

        let critical = html.find("Critical Priority Issues").unwrap();
        let medium = html.find("Medium Priority Issues").unwrap();
        assert!(critical < medium);
    }

    #[test]
    fn long_messages_are_truncated_and_markup_escaped() {
        let mut noisy = detail("seo", "title_tag", CheckStatus::Fail, Priority::High, None);
        noisy.message = format!("<b>{}</b>", "x".repeat(80));

        let html = render_html(&data(vec![noisy]), &WhiteLabelConfig::default());
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("..."));
        assert!(!html.contains("<b>xxxx"));
    }

    #[tokio::test]
    async fn render_writes_both_formats_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let data = data(vec![]);

        let (html_path, html_kb) = generator
            .render(&data, ReportFormat::Html, &WhiteLabelConfig::default())
            .await
            .unwrap();
        assert!(html_path.ends_with("seo_report_example.com_a1.html"));
        assert!(html_kb >= 1);

        let (json_path, _) = generator
            .render(&data, ReportFormat::Json, &WhiteLabelConfig::default())
            .await
            .unwrap();
        assert!(json_path.ends_with("seo_report_example.com_a1.json"));

        let stored = tokio::fs::read_to_string(&json_path).await.unwrap();
        let parsed: Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed["audit"]["domain"], "example.com");
    }

    #[test]
    fn format_parsing_rejects_unknown_types() {
        assert_eq!(ReportFormat::parse("html"), Some(ReportFormat::Html));
        assert_eq!(ReportFormat::parse("json"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::parse("pdf"), None);
    }
}
