//! SQLite repositories, one per aggregate.
//!
//! Conventions shared by every repository here:
//! - datetimes are stored as RFC 3339 TEXT and parsed leniently on the way out
//! - JSON columns are TEXT holding serde_json payloads
//! - booleans are INTEGER 0/1

mod audit_repository;
mod backlink_repository;
mod detail_repository;
mod metrics_repository;
mod report_repository;
mod security_repository;
mod social_repository;
mod website_repository;

pub use audit_repository::{AuditRepository, AuditStats, RecentAudit};
pub use backlink_repository::{
    BacklinkMetrics, BacklinkRepository, BacklinkUpdate, DomainStats, MonthlyGrowth,
    RecentBacklink, ReferringDomain, TopDomain,
};
pub use detail_repository::DetailRepository;
pub use metrics_repository::MetricsRepository;
pub use report_repository::{ReportListItem, ReportRepository};
pub use security_repository::{
    GradeCount, RecentScan, ScoreRangeCount, SecurityRepository, SecurityStatistics,
};
pub use social_repository::{
    PlatformStat, RecentProfile, SocialProfileUpdate, SocialRepository, TopProfile,
};
pub use website_repository::WebsiteRepository;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::models::{AuditStatus, CheckStatus, Priority};

/// Parse a stored RFC 3339 timestamp, falling back to now on malformed data.
pub(crate) fn parse_datetime(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a JSON TEXT column, falling back to an empty object for NULL or
/// malformed payloads.
pub(crate) fn parse_json(raw: Option<&str>) -> Value {
    raw.and_then(|text| serde_json::from_str(text).ok())
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
}

/// Map database string to AuditStatus.
pub fn map_audit_status(s: &str) -> AuditStatus {
    match s {
        "running" => AuditStatus::Running,
        "completed" => AuditStatus::Completed,
        "failed" => AuditStatus::Failed,
        _ => AuditStatus::Pending,
    }
}

/// Map database string to CheckStatus.
pub fn map_check_status(s: &str) -> CheckStatus {
    match s {
        "pass" => CheckStatus::Pass,
        "warning" => CheckStatus::Warning,
        "fail" => CheckStatus::Fail,
        _ => CheckStatus::Info,
    }
}

/// Map database string to Priority.
pub fn map_priority(s: &str) -> Priority {
    match s {
        "critical" => Priority::Critical,
        "high" => Priority::High,
        "low" => Priority::Low,
        _ => Priority::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_round_trip() {
        let now = Utc::now();
        let parsed = parse_datetime(&now.to_rfc3339());
        assert_eq!(parsed.timestamp(), now.timestamp());
    }

    #[test]
    fn unknown_status_strings_fall_back() {
        assert_eq!(map_audit_status("bogus"), AuditStatus::Pending);
        assert_eq!(map_check_status("bogus"), CheckStatus::Info);
        assert_eq!(map_priority("bogus"), Priority::Medium);
    }

    #[test]
    fn malformed_json_becomes_empty_object() {
        assert_eq!(parse_json(None), serde_json::json!({}));
        assert_eq!(parse_json(Some("not json")), serde_json::json!({}));
        assert_eq!(
            parse_json(Some(r#"{"a":1}"#)),
            serde_json::json!({"a": 1})
        );
    }
}
