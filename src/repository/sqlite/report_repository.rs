//! Report rows. The rendered file lives on disk, the row tracks it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::parse_datetime;
use crate::domain::models::Report;

/// Row of the report listing, joined with its audit and website.
#[derive(Debug, Clone, Serialize)]
pub struct ReportListItem {
    pub id: i64,
    pub audit_id: String,
    pub domain: String,
    pub url: String,
    pub overall_score: Option<i64>,
    pub report_type: String,
    pub file_size_kb: Option<i64>,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
}

pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        audit_id: &str,
        report_type: &str,
        file_path: &str,
        file_size_kb: i64,
        white_label_id: Option<i64>,
    ) -> Result<Report> {
        let result = sqlx::query(
            r#"
            INSERT INTO reports
                (audit_id, report_type, file_path, file_size_kb, white_label_id,
                 download_count, is_public, created_at)
            VALUES (?, ?, ?, ?, ?, 0, 0, ?)
            "#,
        )
        .bind(audit_id)
        .bind(report_type)
        .bind(file_path)
        .bind(file_size_kb)
        .bind(white_label_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to create report record")?;

        let report = self
            .get_by_id(result.last_insert_rowid())
            .await?
            .context("Report missing right after insert")?;

        tracing::info!(report_id = report.id, audit_id, report_type, "generated report");
        Ok(report)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Report>> {
        let row = sqlx::query("SELECT * FROM reports WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch report")?;

        Ok(row.as_ref().map(row_to_report))
    }

    /// Earliest report of the given type for an audit, if one exists.
    pub async fn find_for_audit(&self, audit_id: &str, report_type: &str) -> Result<Option<Report>> {
        let row = sqlx::query(
            "SELECT * FROM reports WHERE audit_id = ? AND report_type = ? ORDER BY id LIMIT 1",
        )
        .bind(audit_id)
        .bind(report_type)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up existing report")?;

        Ok(row.as_ref().map(row_to_report))
    }

    /// Newest first, joined with audit and website for the listing payload.
    pub async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<ReportListItem>, i64)> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.audit_id, r.report_type, r.file_size_kb, r.download_count,
                   r.created_at, a.url, a.overall_score, w.domain
            FROM reports r
            JOIN audits a ON a.id = r.audit_id
            JOIN websites w ON w.id = a.website_id
            ORDER BY r.created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list reports")?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count reports")?;

        let items = rows
            .iter()
            .map(|row| ReportListItem {
                id: row.get("id"),
                audit_id: row.get("audit_id"),
                domain: row.get("domain"),
                url: row.get("url"),
                overall_score: row.get("overall_score"),
                report_type: row.get("report_type"),
                file_size_kb: row.get("file_size_kb"),
                download_count: row.get("download_count"),
                created_at: parse_datetime(row.get("created_at")),
            })
            .collect();

        Ok((items, total))
    }

    pub async fn increment_download(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE reports SET download_count = download_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to record report download")?;

        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete report")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_report(row: &SqliteRow) -> Report {
    Report {
        id: row.get("id"),
        audit_id: row.get("audit_id"),
        report_type: row.get("report_type"),
        file_path: row.get("file_path"),
        file_size_kb: row.get("file_size_kb"),
        white_label_id: row.get("white_label_id"),
        download_count: row.get("download_count"),
        is_public: row.get::<i64, _>("is_public") != 0,
        expires_at: row.get::<Option<&str>, _>("expires_at").map(parse_datetime),
        created_at: parse_datetime(row.get("created_at")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{seed_audit, seed_website, setup_test_db};

    #[tokio::test]
    async fn create_and_find_for_audit() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let audit_id =
            seed_audit(&pool, site_id, "https://example.com/", "completed", Some(82)).await;
        let repo = ReportRepository::new(pool);

        let report = repo
            .create(&audit_id, "html", "data/reports/seo_report_x.html", 14, None)
            .await
            .unwrap();
        assert_eq!(report.download_count, 0);
        assert_eq!(report.file_size_kb, Some(14));

        let found = repo.find_for_audit(&audit_id, "html").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(report.id));

        let missing = repo.find_for_audit(&audit_id, "json").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn list_joins_audit_and_website() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let audit_id =
            seed_audit(&pool, site_id, "https://example.com/", "completed", Some(82)).await;
        let repo = ReportRepository::new(pool);
        repo.create(&audit_id, "html", "data/reports/a.html", 10, None)
            .await
            .unwrap();

        let (items, total) = repo.list(1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].domain, "example.com");
        assert_eq!(items[0].overall_score, Some(82));
        assert_eq!(items[0].report_type, "html");
    }

    #[tokio::test]
    async fn download_counter_increments() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let audit_id =
            seed_audit(&pool, site_id, "https://example.com/", "completed", Some(82)).await;
        let repo = ReportRepository::new(pool);
        let report = repo
            .create(&audit_id, "html", "data/reports/a.html", 10, None)
            .await
            .unwrap();

        repo.increment_download(report.id).await.unwrap();
        repo.increment_download(report.id).await.unwrap();

        let stored = repo.get_by_id(report.id).await.unwrap().unwrap();
        assert_eq!(stored.download_count, 2);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let audit_id =
            seed_audit(&pool, site_id, "https://example.com/", "completed", Some(82)).await;
        let repo = ReportRepository::new(pool);
        let report = repo
            .create(&audit_id, "html", "data/reports/a.html", 10, None)
            .await
            .unwrap();

        assert!(repo.delete(report.id).await.unwrap());
        assert!(!repo.delete(report.id).await.unwrap());
    }
}
