//! Audit repository.
//!
//! Audit ids are UUID v4 strings. A row is created in `running` state when an
//! analysis starts and flipped to `completed` or `failed` exactly once.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{map_audit_status, parse_datetime};
use crate::domain::models::{Audit, AuditStatus};

/// Cross-website audit totals backing the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AuditStats {
    pub total_audits: i64,
    pub completed_audits: i64,
    pub failed_audits: i64,
    pub average_score: Option<f64>,
}

/// Recent audit joined with its website's domain.
#[derive(Debug, Clone, Serialize)]
pub struct RecentAudit {
    pub id: String,
    pub domain: String,
    pub url: String,
    pub overall_score: Option<i64>,
    pub status: AuditStatus,
    pub started_at: DateTime<Utc>,
}

pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new audit in `running` state and return it.
    pub async fn create(
        &self,
        website_id: i64,
        url: &str,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<Audit> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO audits (id, website_id, url, audit_type, status, started_at, user_agent, ip_address)
            VALUES (?, ?, ?, 'full', 'running', ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(website_id)
        .bind(url)
        .bind(&now)
        .bind(user_agent)
        .bind(ip_address)
        .execute(&self.pool)
        .await
        .context("Failed to create audit")?;

        tracing::info!(audit_id = %id, url, "started audit");

        self.get_by_id(&id)
            .await?
            .context("Audit missing right after insert")
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Audit>> {
        let row = sqlx::query("SELECT * FROM audits WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch audit")?;

        Ok(row.map(|r| row_to_audit(&r)))
    }

    /// Mark the audit completed with its final score.
    pub async fn complete(&self, id: &str, overall_score: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE audits
            SET status = 'completed', overall_score = ?, completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(overall_score)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to complete audit")?;

        Ok(())
    }

    /// Mark the audit failed, keeping the error for the history endpoints.
    pub async fn fail(&self, id: &str, error_message: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE audits
            SET status = 'failed', error_message = ?, completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(error_message)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to mark audit failed")?;

        Ok(())
    }

    pub async fn latest_for_website(&self, website_id: i64) -> Result<Option<Audit>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM audits
            WHERE website_id = ?
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(website_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch latest audit")?;

        Ok(row.map(|r| row_to_audit(&r)))
    }

    /// Most recent audits for a website, newest first.
    pub async fn recent_for_website(&self, website_id: i64, limit: i64) -> Result<Vec<Audit>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM audits
            WHERE website_id = ?
            ORDER BY started_at DESC
            LIMIT ?
            "#,
        )
        .bind(website_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent audits")?;

        Ok(rows.iter().map(row_to_audit).collect())
    }

    /// Page of a website's audits plus the total row count.
    pub async fn list_for_website(
        &self,
        website_id: i64,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Audit>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audits WHERE website_id = ?")
            .bind(website_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count audits")?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM audits
            WHERE website_id = ?
            ORDER BY started_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(website_id)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list audits")?;

        Ok((rows.iter().map(row_to_audit).collect(), total))
    }

    /// Totals across every website. The average ignores audits without a score.
    pub async fn stats(&self) -> Result<AuditStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END) AS completed,
                SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END) AS failed,
                AVG(overall_score) AS average_score
            FROM audits
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute audit stats")?;

        Ok(AuditStats {
            total_audits: row.get("total"),
            completed_audits: row.get::<Option<i64>, _>("completed").unwrap_or(0),
            failed_audits: row.get::<Option<i64>, _>("failed").unwrap_or(0),
            average_score: row.get("average_score"),
        })
    }

    /// Latest audits across every website, joined with the domain.
    pub async fn recent_with_domain(&self, limit: i64) -> Result<Vec<RecentAudit>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.url, a.overall_score, a.status, a.started_at, w.domain
            FROM audits a
            JOIN websites w ON w.id = a.website_id
            ORDER BY a.started_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent audits")?;

        Ok(rows
            .iter()
            .map(|row| RecentAudit {
                id: row.get("id"),
                domain: row.get("domain"),
                url: row.get("url"),
                overall_score: row.get("overall_score"),
                status: map_audit_status(row.get("status")),
                started_at: parse_datetime(row.get("started_at")),
            })
            .collect())
    }
}

fn row_to_audit(row: &SqliteRow) -> Audit {
    Audit {
        id: row.get("id"),
        website_id: row.get("website_id"),
        url: row.get("url"),
        audit_type: row.get("audit_type"),
        overall_score: row.get("overall_score"),
        status: map_audit_status(row.get("status")),
        started_at: parse_datetime(row.get("started_at")),
        completed_at: row
            .get::<Option<&str>, _>("completed_at")
            .map(parse_datetime),
        error_message: row.get("error_message"),
        user_agent: row.get("user_agent"),
        ip_address: row.get("ip_address"),
        is_public: row.get::<i64, _>("is_public") != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{seed_website, setup_test_db};

    #[tokio::test]
    async fn create_then_complete_round_trips() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let repo = AuditRepository::new(pool);

        let audit = repo
            .create(site_id, "https://example.com/", Some("agent/1.0"), None)
            .await
            .unwrap();
        assert_eq!(audit.status, AuditStatus::Running);
        assert!(audit.overall_score.is_none());
        assert!(audit.completed_at.is_none());

        repo.complete(&audit.id, 87).await.unwrap();

        let done = repo.get_by_id(&audit.id).await.unwrap().unwrap();
        assert_eq!(done.status, AuditStatus::Completed);
        assert_eq!(done.overall_score, Some(87));
        assert!(done.completed_at.is_some());
        assert_eq!(done.user_agent.as_deref(), Some("agent/1.0"));
    }

    #[tokio::test]
    async fn fail_records_the_error_message() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let repo = AuditRepository::new(pool);

        let audit = repo
            .create(site_id, "https://example.com/", None, None)
            .await
            .unwrap();
        repo.fail(&audit.id, "connection refused").await.unwrap();

        let failed = repo.get_by_id(&audit.id).await.unwrap().unwrap();
        assert_eq!(failed.status, AuditStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("connection refused"));
        assert!(failed.overall_score.is_none());
    }

    #[tokio::test]
    async fn listing_pages_newest_first() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let repo = AuditRepository::new(pool);

        for _ in 0..3 {
            repo.create(site_id, "https://example.com/", None, None)
                .await
                .unwrap();
        }

        let (page, total) = repo.list_for_website(site_id, 1, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert!(page[0].started_at >= page[1].started_at);

        let (rest, _) = repo.list_for_website(site_id, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
    }

    #[tokio::test]
    async fn stats_counts_by_status() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let repo = AuditRepository::new(pool);

        let a = repo
            .create(site_id, "https://example.com/", None, None)
            .await
            .unwrap();
        repo.complete(&a.id, 70).await.unwrap();
        let b = repo
            .create(site_id, "https://example.com/", None, None)
            .await
            .unwrap();
        repo.fail(&b.id, "timeout").await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_audits, 2);
        assert_eq!(stats.completed_audits, 1);
        assert_eq!(stats.failed_audits, 1);
        assert_eq!(stats.average_score, Some(70.0));

        let recent = repo.recent_with_domain(5).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].domain, "example.com");
    }
}
