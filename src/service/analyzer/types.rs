//! Shared types for audit check results.

use serde::Serialize;

use crate::domain::models::{CheckStatus, PerformanceMetrics, Priority, SecurityScan, SeoMetrics};

pub const CATEGORY_SEO: &str = "seo";
pub const CATEGORY_TECHNICAL: &str = "technical";
pub const CATEGORY_CONTENT: &str = "content";
pub const CATEGORY_PERFORMANCE: &str = "performance";
pub const CATEGORY_MOBILE: &str = "mobile";

/// One named check with its verdict and earned points.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub category: &'static str,
    pub check_name: &'static str,
    pub status: CheckStatus,
    pub score: i64,
    pub max_score: i64,
    pub message: String,
    pub recommendation: Option<String>,
    pub priority: Priority,
}

impl CheckOutcome {
    pub fn new(
        category: &'static str,
        check_name: &'static str,
        status: CheckStatus,
        score: i64,
        max_score: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            check_name,
            status,
            score,
            max_score,
            message: message.into(),
            recommendation: None,
            priority: Priority::Low,
        }
    }

    pub fn recommend(mut self, text: &str) -> Self {
        self.recommendation = Some(text.to_string());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Earned points over possible points, scaled to an integer 0-100.
///
/// Pure and order-insensitive; an empty check list scores zero.
pub fn overall_score(checks: &[CheckOutcome]) -> i64 {
    let earned: i64 = checks.iter().map(|c| c.score).sum();
    let possible: i64 = checks.iter().map(|c| c.max_score).sum();
    if possible == 0 {
        return 0;
    }
    ((earned as f64 / possible as f64) * 100.0).round() as i64
}

/// Everything produced by analyzing one page, ready to persist.
///
/// The metric rows carry an empty `audit_id`; the runner assigns it when the
/// audit row exists.
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub url: String,
    pub domain: String,
    pub overall_score: i64,
    pub checks: Vec<CheckOutcome>,
    pub seo_metrics: SeoMetrics,
    pub performance: PerformanceMetrics,
    pub security: SecurityScan,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(score: i64, max_score: i64) -> CheckOutcome {
        CheckOutcome::new(
            CATEGORY_SEO,
            "title_tag",
            CheckStatus::Pass,
            score,
            max_score,
            "x",
        )
    }

    #[test]
    fn overall_score_scales_to_percentage() {
        let checks = vec![check(10, 10), check(5, 10), check(0, 5)];
        // 15 / 25 = 60%
        assert_eq!(overall_score(&checks), 60);
    }

    #[test]
    fn overall_score_rounds_to_nearest_integer() {
        let checks = vec![check(2, 3)];
        // 66.66... rounds to 67
        assert_eq!(overall_score(&checks), 67);
    }

    #[test]
    fn overall_score_is_order_insensitive() {
        let mut checks = vec![check(10, 10), check(3, 10), check(7, 10), check(0, 5)];
        let forward = overall_score(&checks);
        checks.reverse();
        assert_eq!(overall_score(&checks), forward);
    }

    #[test]
    fn empty_check_list_scores_zero() {
        assert_eq!(overall_score(&[]), 0);
    }
}
