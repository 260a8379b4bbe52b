//! Backlink rows plus per-website and cross-site aggregations.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::parse_datetime;
use crate::domain::models::Backlink;
use crate::domain::round1;

/// Fields a PUT may change. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BacklinkUpdate {
    pub status: Option<String>,
    pub anchor_text: Option<String>,
    pub link_type: Option<String>,
    pub domain_authority: Option<i64>,
    pub page_authority: Option<i64>,
    pub spam_score: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferringDomain {
    pub domain: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyGrowth {
    pub month: String,
    pub new_backlinks: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BacklinkMetrics {
    pub total_backlinks: i64,
    pub active_backlinks: i64,
    pub lost_backlinks: i64,
    pub dofollow_links: i64,
    pub nofollow_links: i64,
    pub average_domain_authority: f64,
    pub top_referring_domains: Vec<ReferringDomain>,
    pub recent_backlinks: i64,
    pub link_growth: Vec<MonthlyGrowth>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopDomain {
    pub domain: String,
    pub backlink_count: i64,
    pub avg_domain_authority: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentBacklink {
    pub id: i64,
    pub source_domain: String,
    pub target_domain: String,
    pub anchor_text: Option<String>,
    pub status: String,
    pub discovered_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainStats {
    pub total_backlinks: i64,
    pub active_backlinks: i64,
    pub lost_backlinks: i64,
    pub top_domains: Vec<TopDomain>,
    pub recent_activity: Vec<RecentBacklink>,
}

pub struct BacklinkRepository {
    pool: SqlitePool,
}

impl BacklinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest first. `status` of `None` returns every row.
    pub async fn list_for_website(
        &self,
        website_id: i64,
        status: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Backlink>, i64)> {
        let offset = (page - 1) * per_page;

        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT * FROM backlinks
                    WHERE website_id = ? AND status = ?
                    ORDER BY discovered_date DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(website_id)
                .bind(status)
                .bind(per_page)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT * FROM backlinks
                    WHERE website_id = ?
                    ORDER BY discovered_date DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(website_id)
                .bind(per_page)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list backlinks")?;

        let total: i64 = match status {
            Some(status) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM backlinks WHERE website_id = ? AND status = ?",
                )
                .bind(website_id)
                .bind(status)
                .fetch_one(&self.pool)
                .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM backlinks WHERE website_id = ?")
                    .bind(website_id)
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .context("Failed to count backlinks")?;

        Ok((rows.iter().map(row_to_backlink).collect(), total))
    }

    /// Every row for a website, oldest first. Used by the CSV export.
    pub async fn all_for_website(&self, website_id: i64) -> Result<Vec<Backlink>> {
        let rows = sqlx::query("SELECT * FROM backlinks WHERE website_id = ? ORDER BY id")
            .bind(website_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to load backlinks for export")?;

        Ok(rows.iter().map(row_to_backlink).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Backlink>> {
        let row = sqlx::query("SELECT * FROM backlinks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch backlink")?;

        Ok(row.as_ref().map(row_to_backlink))
    }

    /// Applies the provided fields and stamps `last_seen`. Returns the
    /// updated row, or `None` when no such backlink exists.
    pub async fn update(&self, id: i64, update: &BacklinkUpdate) -> Result<Option<Backlink>> {
        let result = sqlx::query(
            r#"
            UPDATE backlinks SET
                status = COALESCE(?, status),
                anchor_text = COALESCE(?, anchor_text),
                link_type = COALESCE(?, link_type),
                domain_authority = COALESCE(?, domain_authority),
                page_authority = COALESCE(?, page_authority),
                spam_score = COALESCE(?, spam_score),
                last_seen = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.status)
        .bind(&update.anchor_text)
        .bind(&update.link_type)
        .bind(update.domain_authority)
        .bind(update.page_authority)
        .bind(update.spam_score)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update backlink")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM backlinks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete backlink")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn metrics(&self, website_id: i64) -> Result<BacklinkMetrics> {
        let cutoff = (Utc::now() - Duration::days(30)).to_rfc3339();
        let totals = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) AS active,
                COALESCE(SUM(CASE WHEN status = 'lost' THEN 1 ELSE 0 END), 0) AS lost,
                COALESCE(SUM(CASE WHEN link_type = 'dofollow' THEN 1 ELSE 0 END), 0) AS dofollow,
                COALESCE(SUM(CASE WHEN link_type = 'nofollow' THEN 1 ELSE 0 END), 0) AS nofollow,
                AVG(domain_authority) AS avg_da,
                COALESCE(SUM(CASE WHEN discovered_date >= ? THEN 1 ELSE 0 END), 0) AS recent
            FROM backlinks
            WHERE website_id = ?
            "#,
        )
        .bind(&cutoff)
        .bind(website_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute backlink totals")?;

        let total_backlinks: i64 = totals.get("total");
        if total_backlinks == 0 {
            return Ok(BacklinkMetrics {
                total_backlinks: 0,
                active_backlinks: 0,
                lost_backlinks: 0,
                dofollow_links: 0,
                nofollow_links: 0,
                average_domain_authority: 0.0,
                top_referring_domains: Vec::new(),
                recent_backlinks: 0,
                link_growth: Vec::new(),
            });
        }

        let top_rows = sqlx::query(
            r#"
            SELECT source_domain, COUNT(*) AS count
            FROM backlinks
            WHERE website_id = ? AND status = 'active'
            GROUP BY source_domain
            ORDER BY count DESC, source_domain
            LIMIT 10
            "#,
        )
        .bind(website_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute top referring domains")?;

        let top_referring_domains = top_rows
            .iter()
            .map(|row| ReferringDomain {
                domain: row.get("source_domain"),
                count: row.get("count"),
            })
            .collect();

        // RFC 3339 TEXT starts with YYYY-MM, so the month bucket is a prefix.
        let growth_rows = sqlx::query(
            r#"
            SELECT substr(discovered_date, 1, 7) AS month, COUNT(*) AS new_backlinks
            FROM backlinks
            WHERE website_id = ?
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(website_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute link growth")?;

        let mut link_growth: Vec<MonthlyGrowth> = growth_rows
            .iter()
            .map(|row| MonthlyGrowth {
                month: row.get("month"),
                new_backlinks: row.get("new_backlinks"),
            })
            .collect();
        if link_growth.len() > 12 {
            link_growth.drain(..link_growth.len() - 12);
        }

        Ok(BacklinkMetrics {
            total_backlinks,
            active_backlinks: totals.get("active"),
            lost_backlinks: totals.get("lost"),
            dofollow_links: totals.get("dofollow"),
            nofollow_links: totals.get("nofollow"),
            average_domain_authority: totals
                .get::<Option<f64>, _>("avg_da")
                .map(round1)
                .unwrap_or(0.0),
            top_referring_domains,
            recent_backlinks: totals.get("recent"),
            link_growth,
        })
    }

    pub async fn domain_stats(&self) -> Result<DomainStats> {
        let totals = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) AS active,
                COALESCE(SUM(CASE WHEN status = 'lost' THEN 1 ELSE 0 END), 0) AS lost
            FROM backlinks
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute cross-site backlink totals")?;

        let top_rows = sqlx::query(
            r#"
            SELECT w.domain, COUNT(b.id) AS backlink_count,
                   AVG(b.domain_authority) AS avg_domain_authority
            FROM backlinks b
            JOIN websites w ON w.id = b.website_id
            GROUP BY w.domain
            ORDER BY backlink_count DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute top backlinked domains")?;

        let top_domains = top_rows
            .iter()
            .map(|row| TopDomain {
                domain: row.get("domain"),
                backlink_count: row.get("backlink_count"),
                avg_domain_authority: row
                    .get::<Option<f64>, _>("avg_domain_authority")
                    .map(round1)
                    .unwrap_or(0.0),
            })
            .collect();

        let recent_rows = sqlx::query(
            r#"
            SELECT b.id, b.source_domain, b.anchor_text, b.status, b.discovered_date,
                   w.domain AS target_domain
            FROM backlinks b
            JOIN websites w ON w.id = b.website_id
            ORDER BY b.discovered_date DESC
            LIMIT 20
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent backlink activity")?;

        let recent_activity = recent_rows
            .iter()
            .map(|row| RecentBacklink {
                id: row.get("id"),
                source_domain: row.get("source_domain"),
                target_domain: row.get("target_domain"),
                anchor_text: row.get("anchor_text"),
                status: row.get("status"),
                discovered_date: parse_datetime(row.get("discovered_date")),
            })
            .collect();

        Ok(DomainStats {
            total_backlinks: totals.get("total"),
            active_backlinks: totals.get("active"),
            lost_backlinks: totals.get("lost"),
            top_domains,
            recent_activity,
        })
    }
}

fn row_to_backlink(row: &SqliteRow) -> Backlink {
    Backlink {
        id: row.get("id"),
        website_id: row.get("website_id"),
        source_domain: row.get("source_domain"),
        source_url: row.get("source_url"),
        target_url: row.get("target_url"),
        anchor_text: row.get("anchor_text"),
        link_type: row.get("link_type"),
        discovered_date: parse_datetime(row.get("discovered_date")),
        last_seen: row.get::<Option<&str>, _>("last_seen").map(parse_datetime),
        status: row.get("status"),
        domain_authority: row.get("domain_authority"),
        page_authority: row.get("page_authority"),
        spam_score: row.get("spam_score"),
        link_context: row.get("link_context"),
        is_internal: row.get::<i64, _>("is_internal") != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{seed_backlink, seed_website, setup_test_db};

    #[tokio::test]
    async fn list_filters_by_status() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let now = Utc::now();
        seed_backlink(&pool, site_id, "blog.io", "active", "dofollow", Some(40), now).await;
        seed_backlink(&pool, site_id, "news.io", "lost", "dofollow", Some(30), now).await;
        let repo = BacklinkRepository::new(pool);

        let (all, total) = repo.list_for_website(site_id, None, 1, 20).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);

        let (active, total) = repo
            .list_for_website(site_id, Some("active"), 1, 20)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(active[0].source_domain, "blog.io");
    }

    #[tokio::test]
    async fn update_touches_only_provided_fields() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let id = seed_backlink(
            &pool,
            site_id,
            "blog.io",
            "active",
            "dofollow",
            Some(40),
            Utc::now(),
        )
        .await;
        let repo = BacklinkRepository::new(pool);

        let update = BacklinkUpdate {
            status: Some("lost".to_string()),
            domain_authority: Some(55),
            ..Default::default()
        };
        let updated = repo.update(id, &update).await.unwrap().unwrap();

        assert_eq!(updated.status, "lost");
        assert_eq!(updated.domain_authority, Some(55));
        assert_eq!(updated.link_type.as_deref(), Some("dofollow"));
        assert_eq!(updated.anchor_text.as_deref(), Some("example"));
        assert!(updated.last_seen.is_some());
    }

    #[tokio::test]
    async fn update_missing_row_returns_none() {
        let pool = setup_test_db().await;
        let repo = BacklinkRepository::new(pool);

        let outcome = repo.update(99, &BacklinkUpdate::default()).await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let id = seed_backlink(
            &pool,
            site_id,
            "blog.io",
            "active",
            "dofollow",
            None,
            Utc::now(),
        )
        .await;
        let repo = BacklinkRepository::new(pool);

        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn metrics_aggregate_counts_and_growth() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let now = Utc::now();
        let old = now - Duration::days(90);
        seed_backlink(&pool, site_id, "blog.io", "active", "dofollow", Some(40), now).await;
        seed_backlink(&pool, site_id, "blog.io", "active", "nofollow", Some(60), now).await;
        seed_backlink(&pool, site_id, "news.io", "lost", "dofollow", None, old).await;
        let repo = BacklinkRepository::new(pool);

        let metrics = repo.metrics(site_id).await.unwrap();
        assert_eq!(metrics.total_backlinks, 3);
        assert_eq!(metrics.active_backlinks, 2);
        assert_eq!(metrics.lost_backlinks, 1);
        assert_eq!(metrics.dofollow_links, 2);
        assert_eq!(metrics.nofollow_links, 1);
        assert_eq!(metrics.average_domain_authority, 50.0);
        assert_eq!(metrics.recent_backlinks, 2);
        assert_eq!(metrics.top_referring_domains.len(), 1);
        assert_eq!(metrics.top_referring_domains[0].domain, "blog.io");
        assert_eq!(metrics.top_referring_domains[0].count, 2);
        assert_eq!(metrics.link_growth.len(), 2);
        assert_eq!(
            metrics.link_growth[0].month,
            old.format("%Y-%m").to_string()
        );
    }

    #[tokio::test]
    async fn metrics_for_website_without_backlinks() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let repo = BacklinkRepository::new(pool);

        let metrics = repo.metrics(site_id).await.unwrap();
        assert_eq!(metrics.total_backlinks, 0);
        assert_eq!(metrics.average_domain_authority, 0.0);
        assert!(metrics.top_referring_domains.is_empty());
        assert!(metrics.link_growth.is_empty());
    }

    #[tokio::test]
    async fn domain_stats_span_websites() {
        let pool = setup_test_db().await;
        let first = seed_website(&pool, "example.com").await;
        let second = seed_website(&pool, "other.org").await;
        let now = Utc::now();
        seed_backlink(&pool, first, "blog.io", "active", "dofollow", Some(40), now).await;
        seed_backlink(&pool, first, "news.io", "lost", "dofollow", Some(20), now).await;
        seed_backlink(&pool, second, "blog.io", "active", "nofollow", None, now).await;
        let repo = BacklinkRepository::new(pool);

        let stats = repo.domain_stats().await.unwrap();
        assert_eq!(stats.total_backlinks, 3);
        assert_eq!(stats.active_backlinks, 2);
        assert_eq!(stats.lost_backlinks, 1);
        assert_eq!(stats.top_domains[0].domain, "example.com");
        assert_eq!(stats.top_domains[0].backlink_count, 2);
        assert_eq!(stats.top_domains[0].avg_domain_authority, 30.0);
        assert_eq!(stats.recent_activity.len(), 3);
        assert!(stats
            .recent_activity
            .iter()
            .any(|b| b.target_domain == "other.org"));
    }
}
