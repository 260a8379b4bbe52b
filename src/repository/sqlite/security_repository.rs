//! Security scan persistence and fleet-wide scan statistics.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{parse_datetime, parse_json};
use crate::domain::models::SecurityScan;
use crate::domain::{round1, round2};

#[derive(Debug, Clone, Serialize)]
pub struct GradeCount {
    pub grade: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreRangeCount {
    pub range: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentScan {
    pub scan_id: i64,
    pub domain: String,
    pub security_score: f64,
    pub ssl_grade: Option<String>,
    pub malware_detected: bool,
    pub scan_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityStatistics {
    pub total_scans: i64,
    pub malware_detections: i64,
    pub malware_rate: f64,
    pub average_security_score: f64,
    pub ssl_grade_distribution: Vec<GradeCount>,
    pub security_score_distribution: Vec<ScoreRangeCount>,
    pub recent_scans: Vec<RecentScan>,
}

pub struct SecurityRepository {
    pool: SqlitePool,
}

impl SecurityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Save the scan for an audit, replacing any earlier scan of that audit.
    pub async fn save(&self, scan: &SecurityScan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO security_scans
                (audit_id, ssl_certificate, ssl_grade, ssl_expires_at, malware_detected,
                 blacklist_status, security_headers, vulnerabilities, security_score,
                 scan_timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(audit_id) DO UPDATE SET
                ssl_certificate = excluded.ssl_certificate,
                ssl_grade = excluded.ssl_grade,
                ssl_expires_at = excluded.ssl_expires_at,
                malware_detected = excluded.malware_detected,
                blacklist_status = excluded.blacklist_status,
                security_headers = excluded.security_headers,
                vulnerabilities = excluded.vulnerabilities,
                security_score = excluded.security_score,
                scan_timestamp = excluded.scan_timestamp
            "#,
        )
        .bind(&scan.audit_id)
        .bind(scan.ssl_certificate.to_string())
        .bind(&scan.ssl_grade)
        .bind(scan.ssl_expires_at.map(|at| at.to_rfc3339()))
        .bind(scan.malware_detected)
        .bind(scan.blacklist_status.to_string())
        .bind(scan.security_headers.to_string())
        .bind(scan.vulnerabilities.to_string())
        .bind(scan.security_score)
        .bind(scan.scan_timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save security scan")?;

        Ok(())
    }

    /// Returns the scan row id together with the scan itself.
    pub async fn get_for_audit(&self, audit_id: &str) -> Result<Option<(i64, SecurityScan)>> {
        let row = sqlx::query("SELECT * FROM security_scans WHERE audit_id = ?")
            .bind(audit_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch security scan")?;

        Ok(row.map(|r| (r.get("id"), row_to_scan(&r))))
    }

    pub async fn statistics(&self) -> Result<SecurityStatistics> {
        let totals = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_scans,
                COALESCE(SUM(CASE WHEN malware_detected != 0 THEN 1 ELSE 0 END), 0)
                    AS malware_detections,
                AVG(security_score) AS average_score
            FROM security_scans
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute security scan totals")?;

        let total_scans: i64 = totals.get("total_scans");
        let malware_detections: i64 = totals.get("malware_detections");
        let malware_rate = if total_scans > 0 {
            round2(malware_detections as f64 / total_scans as f64 * 100.0)
        } else {
            0.0
        };
        let average_security_score = totals
            .get::<Option<f64>, _>("average_score")
            .map(round1)
            .unwrap_or(0.0);

        let grade_rows = sqlx::query(
            r#"
            SELECT ssl_grade, COUNT(*) AS count
            FROM security_scans
            WHERE ssl_grade IS NOT NULL
            GROUP BY ssl_grade
            ORDER BY ssl_grade
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute SSL grade distribution")?;

        let ssl_grade_distribution = grade_rows
            .iter()
            .map(|row| GradeCount {
                grade: row.get("ssl_grade"),
                count: row.get("count"),
            })
            .collect();

        let range_rows = sqlx::query(
            r#"
            SELECT
                CASE
                    WHEN security_score >= 90 THEN '90-100'
                    WHEN security_score >= 80 THEN '80-89'
                    WHEN security_score >= 70 THEN '70-79'
                    WHEN security_score >= 60 THEN '60-69'
                    ELSE '0-59'
                END AS score_range,
                COUNT(*) AS count
            FROM security_scans
            GROUP BY score_range
            ORDER BY score_range DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute security score distribution")?;

        let security_score_distribution = range_rows
            .iter()
            .map(|row| ScoreRangeCount {
                range: row.get("score_range"),
                count: row.get("count"),
            })
            .collect();

        let recent_rows = sqlx::query(
            r#"
            SELECT s.id, s.security_score, s.ssl_grade, s.malware_detected,
                   s.scan_timestamp, w.domain
            FROM security_scans s
            JOIN audits a ON a.id = s.audit_id
            JOIN websites w ON w.id = a.website_id
            ORDER BY s.scan_timestamp DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent security scans")?;

        let recent_scans = recent_rows
            .iter()
            .map(|row| RecentScan {
                scan_id: row.get("id"),
                domain: row.get("domain"),
                security_score: row.get::<Option<f64>, _>("security_score").unwrap_or(0.0),
                ssl_grade: row.get("ssl_grade"),
                malware_detected: row.get::<i64, _>("malware_detected") != 0,
                scan_timestamp: parse_datetime(row.get("scan_timestamp")),
            })
            .collect();

        Ok(SecurityStatistics {
            total_scans,
            malware_detections,
            malware_rate,
            average_security_score,
            ssl_grade_distribution,
            security_score_distribution,
            recent_scans,
        })
    }
}

fn row_to_scan(row: &SqliteRow) -> SecurityScan {
    SecurityScan {
        audit_id: row.get("audit_id"),
        ssl_certificate: parse_json(row.get("ssl_certificate")),
        ssl_grade: row.get("ssl_grade"),
        ssl_expires_at: row
            .get::<Option<&str>, _>("ssl_expires_at")
            .map(parse_datetime),
        malware_detected: row.get::<i64, _>("malware_detected") != 0,
        blacklist_status: parse_json(row.get("blacklist_status")),
        security_headers: parse_json(row.get("security_headers")),
        vulnerabilities: parse_json(row.get("vulnerabilities")),
        security_score: row.get::<Option<f64>, _>("security_score").unwrap_or(0.0),
        scan_timestamp: parse_datetime(row.get("scan_timestamp")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{seed_audit, seed_website, setup_test_db};
    use serde_json::json;

    fn scan(audit_id: &str, grade: &str, score: f64, malware: bool) -> SecurityScan {
        SecurityScan {
            audit_id: audit_id.to_string(),
            ssl_certificate: json!({}),
            ssl_grade: Some(grade.to_string()),
            ssl_expires_at: None,
            malware_detected: malware,
            blacklist_status: json!({"blacklisted": false}),
            security_headers: json!({"strict-transport-security": {"present": true}}),
            vulnerabilities: json!([]),
            security_score: score,
            scan_timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_fetch_round_trip() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let audit_id = seed_audit(&pool, site_id, "https://example.com/", "running", None).await;
        let repo = SecurityRepository::new(pool);

        repo.save(&scan(&audit_id, "A", 88.5, false)).await.unwrap();

        let (id, stored) = repo.get_for_audit(&audit_id).await.unwrap().unwrap();
        assert!(id > 0);
        assert_eq!(stored.ssl_grade.as_deref(), Some("A"));
        assert_eq!(stored.security_score, 88.5);
        assert_eq!(stored.blacklist_status["blacklisted"], json!(false));
        assert_eq!(stored.vulnerabilities, json!([]));
    }

    #[tokio::test]
    async fn second_save_replaces_first_scan() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let audit_id = seed_audit(&pool, site_id, "https://example.com/", "running", None).await;
        let repo = SecurityRepository::new(pool.clone());

        repo.save(&scan(&audit_id, "C", 60.0, false)).await.unwrap();
        repo.save(&scan(&audit_id, "A", 95.0, false)).await.unwrap();

        let (_, stored) = repo.get_for_audit(&audit_id).await.unwrap().unwrap();
        assert_eq!(stored.ssl_grade.as_deref(), Some("A"));
        assert_eq!(stored.security_score, 95.0);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM security_scans")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn statistics_aggregate_grade_and_score_buckets() {
        let pool = setup_test_db().await;
        let site_id = seed_website(&pool, "example.com").await;
        let repo = SecurityRepository::new(pool.clone());

        for (grade, score, malware) in
            [("A", 95.0, false), ("A", 85.0, false), ("F", 40.0, true)]
        {
            let audit_id =
                seed_audit(&pool, site_id, "https://example.com/", "completed", Some(70)).await;
            repo.save(&scan(&audit_id, grade, score, malware))
                .await
                .unwrap();
        }

        let stats = repo.statistics().await.unwrap();
        assert_eq!(stats.total_scans, 3);
        assert_eq!(stats.malware_detections, 1);
        assert_eq!(stats.malware_rate, 33.33);
        assert_eq!(stats.average_security_score, 73.3);

        let grades: Vec<(String, i64)> = stats
            .ssl_grade_distribution
            .iter()
            .map(|g| (g.grade.clone(), g.count))
            .collect();
        assert_eq!(grades, vec![("A".to_string(), 2), ("F".to_string(), 1)]);

        let ranges: Vec<(String, i64)> = stats
            .security_score_distribution
            .iter()
            .map(|r| (r.range.clone(), r.count))
            .collect();
        assert_eq!(
            ranges,
            vec![
                ("90-100".to_string(), 1),
                ("80-89".to_string(), 1),
                ("0-59".to_string(), 1),
            ]
        );
        assert_eq!(stats.recent_scans.len(), 3);
        assert_eq!(stats.recent_scans[0].domain, "example.com");
    }

    #[tokio::test]
    async fn statistics_on_empty_database() {
        let pool = setup_test_db().await;
        let repo = SecurityRepository::new(pool);

        let stats = repo.statistics().await.unwrap();
        assert_eq!(stats.total_scans, 0);
        assert_eq!(stats.malware_rate, 0.0);
        assert_eq!(stats.average_security_score, 0.0);
        assert!(stats.ssl_grade_distribution.is_empty());
        assert!(stats.recent_scans.is_empty());
    }
}
