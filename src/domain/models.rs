//! Persisted entities shared by the analyzer, repositories, and API layer

use chrono::{DateTime, Utc};
use serde::Serialize;

// ====== Enums ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Pending => "pending",
            AuditStatus::Running => "running",
            AuditStatus::Completed => "completed",
            AuditStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
    Info,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Warning => "warning",
            CheckStatus::Fail => "fail",
            CheckStatus::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

// ====== Simple Entities (no behavior needed) ======

#[derive(Debug, Clone, Serialize)]
pub struct Website {
    pub id: i64,
    pub domain: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub first_analyzed: Option<DateTime<Utc>>,
    pub last_analyzed: Option<DateTime<Utc>>,
    pub total_audits: i64,
    pub average_score: Option<f64>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Audit {
    pub id: String,
    pub website_id: i64,
    pub url: String,
    pub audit_type: String,
    pub overall_score: Option<i64>,
    pub status: AuditStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditDetail {
    pub audit_id: String,
    pub category: String,
    pub check_name: String,
    pub status: CheckStatus,
    pub score: i64,
    pub max_score: i64,
    pub message: String,
    pub recommendation: Option<String>,
    pub technical_details: Option<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeoMetrics {
    pub audit_id: String,
    pub page_title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub h3_tags: Vec<String>,
    pub images_count: i64,
    pub images_without_alt: i64,
    pub internal_links: i64,
    pub external_links: i64,
    pub word_count: i64,
    pub page_size_kb: f64,
    pub load_time_ms: i64,
    pub mobile_friendly: bool,
    pub ssl_enabled: bool,
    pub robots_txt_exists: bool,
    pub sitemap_exists: bool,
    pub canonical_url: Option<String>,
    pub schema_markup: serde_json::Value,
    pub social_tags: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub audit_id: String,
    pub first_contentful_paint: i64,
    pub largest_contentful_paint: i64,
    pub first_input_delay: i64,
    pub cumulative_layout_shift: f64,
    pub speed_index: i64,
    pub time_to_interactive: i64,
    pub total_blocking_time: i64,
    pub performance_score: i64,
    pub accessibility_score: i64,
    pub best_practices_score: i64,
    pub seo_score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityScan {
    pub audit_id: String,
    pub ssl_certificate: serde_json::Value,
    pub ssl_grade: Option<String>,
    pub ssl_expires_at: Option<DateTime<Utc>>,
    pub malware_detected: bool,
    pub blacklist_status: serde_json::Value,
    pub security_headers: serde_json::Value,
    pub vulnerabilities: serde_json::Value,
    pub security_score: f64,
    pub scan_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Backlink {
    pub id: i64,
    pub website_id: i64,
    pub source_domain: String,
    pub source_url: String,
    pub target_url: String,
    pub anchor_text: Option<String>,
    pub link_type: Option<String>,
    pub discovered_date: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub status: String,
    pub domain_authority: Option<i64>,
    pub page_authority: Option<i64>,
    pub spam_score: Option<i64>,
    pub link_context: Option<String>,
    pub is_internal: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SocialProfile {
    pub id: i64,
    pub website_id: i64,
    pub platform: String,
    pub profile_url: Option<String>,
    pub username: Option<String>,
    pub followers_count: Option<i64>,
    pub following_count: Option<i64>,
    pub posts_count: Option<i64>,
    pub engagement_rate: Option<f64>,
    pub last_post_date: Option<DateTime<Utc>>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile found on a crawled page. Engagement numbers are unknown at
/// discovery time and stay NULL until filled in by hand.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredProfile {
    pub platform: String,
    pub profile_url: String,
    pub username: Option<String>,
    pub discovered_via: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: i64,
    pub audit_id: String,
    pub report_type: String,
    pub file_path: String,
    pub file_size_kb: Option<i64>,
    pub white_label_id: Option<i64>,
    pub download_count: i64,
    pub is_public: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ====== Pagination ======

/// Envelope returned next to every paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Pagination {
            page,
            per_page,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1 && total > 0,
        }
    }

    /// SQL OFFSET for the current page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_partial_last_page() {
        let p = Pagination::new(3, 20, 45);
        assert_eq!(p.pages, 3);
        assert!(!p.has_next);
        assert!(p.has_prev);
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn pagination_exact_multiple() {
        let p = Pagination::new(1, 20, 40);
        assert_eq!(p.pages, 2);
        assert!(p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn pagination_empty_collection() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn status_strings_match_storage_format() {
        assert_eq!(AuditStatus::Running.as_str(), "running");
        assert_eq!(CheckStatus::Warning.as_str(), "warning");
        assert_eq!(Priority::Critical.as_str(), "critical");
    }
}
