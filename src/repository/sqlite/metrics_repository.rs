//! SEO and performance metric rows, one of each per audit.
//!
//! Heading lists and the schema/social payloads are stored as JSON TEXT.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::parse_json;
use crate::domain::models::{PerformanceMetrics, SeoMetrics};

pub struct MetricsRepository {
    pool: SqlitePool,
}

impl MetricsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save_seo(&self, metrics: &SeoMetrics) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO seo_metrics
                (audit_id, page_title, meta_description, h1_tags, h2_tags, h3_tags,
                 images_count, images_without_alt, internal_links, external_links,
                 word_count, page_size_kb, load_time_ms, mobile_friendly, ssl_enabled,
                 robots_txt_exists, sitemap_exists, canonical_url, schema_markup,
                 social_tags, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&metrics.audit_id)
        .bind(&metrics.page_title)
        .bind(&metrics.meta_description)
        .bind(serde_json::to_string(&metrics.h1_tags).unwrap_or_default())
        .bind(serde_json::to_string(&metrics.h2_tags).unwrap_or_default())
        .bind(serde_json::to_string(&metrics.h3_tags).unwrap_or_default())
        .bind(metrics.images_count)
        .bind(metrics.images_without_alt)
        .bind(metrics.internal_links)
        .bind(metrics.external_links)
        .bind(metrics.word_count)
        .bind(metrics.page_size_kb)
        .bind(metrics.load_time_ms)
        .bind(metrics.mobile_friendly)
        .bind(metrics.ssl_enabled)
        .bind(metrics.robots_txt_exists)
        .bind(metrics.sitemap_exists)
        .bind(&metrics.canonical_url)
        .bind(metrics.schema_markup.to_string())
        .bind(metrics.social_tags.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save SEO metrics")?;

        Ok(())
    }

    pub async fn get_seo(&self, audit_id: &str) -> Result<Option<SeoMetrics>> {
        let row = sqlx::query("SELECT * FROM seo_metrics WHERE audit_id = ?")
            .bind(audit_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch SEO metrics")?;

        Ok(row.map(|r| row_to_seo(&r)))
    }

    pub async fn save_performance(&self, metrics: &PerformanceMetrics) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO performance_metrics
                (audit_id, first_contentful_paint, largest_contentful_paint,
                 first_input_delay, cumulative_layout_shift, speed_index,
                 time_to_interactive, total_blocking_time, performance_score,
                 accessibility_score, best_practices_score, seo_score, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&metrics.audit_id)
        .bind(metrics.first_contentful_paint)
        .bind(metrics.largest_contentful_paint)
        .bind(metrics.first_input_delay)
        .bind(metrics.cumulative_layout_shift)
        .bind(metrics.speed_index)
        .bind(metrics.time_to_interactive)
        .bind(metrics.total_blocking_time)
        .bind(metrics.performance_score)
        .bind(metrics.accessibility_score)
        .bind(metrics.best_practices_score)
        .bind(metrics.seo_score)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save performance metrics")?;

        Ok(())
    }

    pub async fn get_performance(&self, audit_id: &str) -> Result<Option<PerformanceMetrics>> {
        let row = sqlx::query("SELECT * FROM performance_metrics WHERE audit_id = ?")
            .bind(audit_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch performance metrics")?;

        Ok(row.map(|r| row_to_performance(&r)))
    }
}

fn parse_string_list(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|text| serde_json::from_str(text).ok())
        .unwrap_or_default()
}

fn row_to_seo(row: &SqliteRow) -> SeoMetrics {
    SeoMetrics {
        audit_id: row.get("audit_id"),
        page_title: row.get("page_title"),
        meta_description: row.get("meta_description"),
        h1_tags: parse_string_list(row.get("h1_tags")),
        h2_tags: parse_string_list(row.get("h2_tags")),
        h3_tags: parse_string_list(row.get("h3_tags")),
        images_count: row.get::<Option<i64>, _>("images_count").unwrap_or(0),
        images_without_alt: row.get::<Option<i64>, _>("images_without_alt").unwrap_or(0),
        internal_links: row.get::<Option<i64>, _>("internal_links").unwrap_or(0),
        external_links: row.get::<Option<i64>, _>("external_links").unwrap_or(0),
        word_count: row.get::<Option<i64>, _>("word_count").unwrap_or(0),
        page_size_kb: row.get::<Option<f64>, _>("page_size_kb").unwrap_or(0.0),
        load_time_ms: row.get::<Option<i64>, _>("load_time_ms").unwrap_or(0),
        mobile_friendly: row.get::<Option<i64>, _>("mobile_friendly").unwrap_or(0) != 0,
        ssl_enabled: row.get::<Option<i64>, _>("ssl_enabled").unwrap_or(0) != 0,
        robots_txt_exists: row.get::<Option<i64>, _>("robots_txt_exists").unwrap_or(0) != 0,
        sitemap_exists: row.get::<Option<i64>, _>("sitemap_exists").unwrap_or(0) != 0,
        canonical_url: row.get("canonical_url"),
        schema_markup: parse_json(row.get("schema_markup")),
        social_tags: parse_json(row.get("social_tags")),
    }
}

fn row_to_performance(row: &SqliteRow) -> PerformanceMetrics {
    PerformanceMetrics {
        audit_id: row.get("audit_id"),
        first_contentful_paint: row
            .get::<Option<i64>, _>("first_contentful_paint")
            .unwrap_or(0),
        largest_contentful_paint: row
            .get::<Option<i64>, _>("largest_contentful_paint")
            .unwrap_or(0),
        first_input_delay: row.get::<Option<i64>, _>("first_input_delay").unwrap_or(0),
        cumulative_layout_shift: row
            .get::<Option<f64>, _>("cumulative_layout_shift")
            .unwrap_or(0.0),
        speed_index: row.get::<Option<i64>, _>("speed_index").unwrap_or(0),
        time_to_interactive: row
            .get::<Option<i64>, _>("time_to_interactive")
            .unwrap_or(0),
        total_blocking_time: row
            .get::<Option<i64>, _>("total_blocking_time")
            .unwrap_or(0),
        performance_score: row.get::<Option<i64>, _>("performance_score").unwrap_or(0),
        accessibility_score: row
            .get::<Option<i64>, _>("accessibility_score")
            .unwrap_or(0),
        best_practices_score: row
            .get::<Option<i64>, _>("best_practices_score")
            .unwrap_or(0),
        seo_score: row.get::<Option<i64>, _>("seo_score").unwrap_or(0),
    }
}
