//! Per-check audit rows, written once per audit in a single transaction.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{map_check_status, map_priority};
use crate::domain::models::AuditDetail;

pub struct DetailRepository {
    pool: SqlitePool,
}

impl DetailRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_batch(&self, details: &[AuditDetail]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open transaction")?;

        for detail in details {
            sqlx::query(
                r#"
                INSERT INTO audit_details
                    (audit_id, category, check_name, status, score, max_score,
                     message, recommendation, technical_details, priority, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&detail.audit_id)
            .bind(&detail.category)
            .bind(&detail.check_name)
            .bind(detail.status.as_str())
            .bind(detail.score)
            .bind(detail.max_score)
            .bind(&detail.message)
            .bind(&detail.recommendation)
            .bind(&detail.technical_details)
            .bind(detail.priority.as_str())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .context("Failed to insert audit detail")?;
        }

        tx.commit().await.context("Failed to commit audit details")
    }

    /// All check rows for an audit in insertion order.
    pub async fn list_for_audit(&self, audit_id: &str) -> Result<Vec<AuditDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT audit_id, category, check_name, status, score, max_score,
                   message, recommendation, technical_details, priority
            FROM audit_details
            WHERE audit_id = ?
            ORDER BY id
            "#,
        )
        .bind(audit_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch audit details")?;

        Ok(rows.iter().map(row_to_detail).collect())
    }
}

fn row_to_detail(row: &SqliteRow) -> AuditDetail {
    AuditDetail {
        audit_id: row.get("audit_id"),
        category: row.get("category"),
        check_name: row.get("check_name"),
        status: map_check_status(row.get("status")),
        score: row.get::<Option<i64>, _>("score").unwrap_or(0),
        max_score: row.get::<Option<i64>, _>("max_score").unwrap_or(0),
        message: row.get::<Option<String>, _>("message").unwrap_or_default(),
        recommendation: row.get("recommendation"),
        technical_details: row.get("technical_details"),
        priority: map_priority(row.get("priority")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CheckStatus, Priority};
    use crate::test_utils::fixtures::{seed_audit, seed_website, setup_test_db};

    fn detail(audit_id: &str, check_name: &str, score: i64) -> AuditDetail {
        AuditDetail {
            audit_id: audit_id.to_string(),
            category: "seo".to_string(),
            check_name: check_name.to_string(),
            status: CheckStatus::Pass,
            score,
            max_score: 10,
            message: "ok".to_string(),
            recommendation: None,
            technical_details: None,
            priority: Priority::Low,
        }
    }

    #[tokio::test]
    async fn batch_insert_preserves_order() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let audit_id = seed_audit(&pool, site_id, "https://example.com/", "running", None).await;
        let repo = DetailRepository::new(pool);

        repo.insert_batch(&[
            detail(&audit_id, "title_tag", 10),
            detail(&audit_id, "meta_description", 8),
            detail(&audit_id, "h1_tag", 10),
        ])
        .await
        .unwrap();

        let stored = repo.list_for_audit(&audit_id).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0].check_name, "title_tag");
        assert_eq!(stored[1].check_name, "meta_description");
        assert_eq!(stored[2].check_name, "h1_tag");
        assert_eq!(stored[1].score, 8);
    }

    #[tokio::test]
    async fn details_are_scoped_to_their_audit() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let first = seed_audit(&pool, site_id, "https://example.com/", "running", None).await;
        let second = seed_audit(&pool, site_id, "https://example.com/", "running", None).await;
        let repo = DetailRepository::new(pool);

        repo.insert_batch(&[detail(&first, "title_tag", 10)])
            .await
            .unwrap();

        assert_eq!(repo.list_for_audit(&first).await.unwrap().len(), 1);
        assert!(repo.list_for_audit(&second).await.unwrap().is_empty());
    }
}
