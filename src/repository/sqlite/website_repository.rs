//! Website repository.
//!
//! One row per domain; aggregate columns (total_audits, average_score,
//! last_analyzed) are recomputed from the audits table whenever an audit
//! finishes.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::parse_datetime;
use crate::domain::models::Website;

pub struct WebsiteRepository {
    pool: SqlitePool,
}

impl WebsiteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the row for `domain`, creating it on first sight.
    pub async fn upsert(&self, domain: &str) -> Result<Website> {
        if let Some(existing) = self.get_by_domain(domain).await? {
            return Ok(existing);
        }

        sqlx::query("INSERT INTO websites (domain) VALUES (?)")
            .bind(domain)
            .execute(&self.pool)
            .await
            .context("Failed to create website")?;

        tracing::info!(domain, "registered new website");

        self.get_by_domain(domain)
            .await?
            .context("Website missing right after insert")
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Website>> {
        let row = sqlx::query("SELECT * FROM websites WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch website")?;

        Ok(row.map(|r| row_to_website(&r)))
    }

    pub async fn get_by_domain(&self, domain: &str) -> Result<Option<Website>> {
        let row = sqlx::query("SELECT * FROM websites WHERE domain = ?")
            .bind(domain)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch website by domain")?;

        Ok(row.map(|r| row_to_website(&r)))
    }

    /// Page of websites ordered by most recently analyzed, with an optional
    /// domain substring filter. Returns the rows plus the unfiltered total.
    pub async fn list(
        &self,
        page: i64,
        per_page: i64,
        search: Option<&str>,
    ) -> Result<(Vec<Website>, i64)> {
        let pattern = search.map(|s| format!("%{s}%"));
        let offset = (page - 1) * per_page;

        let total: i64 = match &pattern {
            Some(p) => sqlx::query_scalar("SELECT COUNT(*) FROM websites WHERE domain LIKE ?")
                .bind(p)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count websites")?,
            None => sqlx::query_scalar("SELECT COUNT(*) FROM websites")
                .fetch_one(&self.pool)
                .await
                .context("Failed to count websites")?,
        };

        let rows = match &pattern {
            Some(p) => {
                sqlx::query(
                    r#"
                    SELECT * FROM websites
                    WHERE domain LIKE ?
                    ORDER BY last_analyzed DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(p)
                .bind(per_page)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT * FROM websites
                    ORDER BY last_analyzed DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(per_page)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list websites")?;

        Ok((rows.iter().map(row_to_website).collect(), total))
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM websites")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count websites")
    }

    /// Refresh aggregates after an audit completed. Title and description are
    /// taken from the audited page when present, otherwise left untouched.
    pub async fn record_audit_outcome(
        &self,
        website_id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            UPDATE websites SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                first_analyzed = COALESCE(first_analyzed, ?),
                last_analyzed = ?,
                total_audits = (
                    SELECT COUNT(*) FROM audits
                    WHERE website_id = ? AND status = 'completed'
                ),
                average_score = (
                    SELECT AVG(overall_score) FROM audits
                    WHERE website_id = ? AND status = 'completed'
                )
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(&now)
        .bind(&now)
        .bind(website_id)
        .bind(website_id)
        .bind(website_id)
        .execute(&self.pool)
        .await
        .context("Failed to update website aggregates")?;

        Ok(())
    }
}

fn row_to_website(row: &SqliteRow) -> Website {
    Website {
        id: row.get("id"),
        domain: row.get("domain"),
        title: row.get("title"),
        description: row.get("description"),
        favicon_url: row.get("favicon_url"),
        first_analyzed: row
            .get::<Option<&str>, _>("first_analyzed")
            .map(parse_datetime),
        last_analyzed: row
            .get::<Option<&str>, _>("last_analyzed")
            .map(parse_datetime),
        total_audits: row.get("total_audits"),
        average_score: row.get("average_score"),
        is_active: row.get::<i64, _>("is_active") != 0,
    }
}
