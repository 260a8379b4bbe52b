//! HTTP surface. One module per resource family, merged into a single
//! router nested under /api, with permissive CORS and request tracing.

pub mod audit;
pub mod backlinks;
pub mod optimization;
pub mod payment;
pub mod reports;
pub mod security;
pub mod social;
pub mod websites;
pub mod white_label;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::AnalysisCache;
use crate::config::AppConfig;
use crate::service::{AuditRunner, LeadStore, SecurityAnalyzer, SocialAnalyzer, WhiteLabelStore};

/// Shared handler state. Repositories are constructed per request from the
/// pool; services that hold HTTP clients or file locks live here once.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub cache: AnalysisCache,
    pub config: AppConfig,
    pub runner: Arc<AuditRunner>,
    pub security: Arc<SecurityAnalyzer>,
    pub social: Arc<SocialAnalyzer>,
    pub leads: Arc<LeadStore>,
    pub white_label: Arc<WhiteLabelStore>,
}

impl AppState {
    /// Builds every shared service over one pool. The file-backed stores
    /// land under the configured data directory.
    pub async fn init(config: AppConfig, pool: SqlitePool) -> anyhow::Result<Self> {
        let cache = AnalysisCache::new();
        let runner = AuditRunner::new(pool.clone(), cache.clone())?;
        let leads = LeadStore::open(config.data_dir.join("leads.json")).await?;
        let white_label = WhiteLabelStore::open(config.data_dir.join("white_label.json")).await?;

        Ok(Self {
            pool,
            cache,
            config,
            runner: Arc::new(runner),
            security: Arc::new(SecurityAnalyzer::new()?),
            social: Arc::new(SocialAnalyzer::new()?),
            leads: Arc::new(leads),
            white_label: Arc::new(white_label),
        })
    }
}

/// Assembles the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(audit::routes())
        .merge(backlinks::routes())
        .merge(optimization::routes())
        .merge(payment::routes())
        .merge(reports::routes())
        .merge(security::routes())
        .merge(social::routes())
        .merge(websites::routes())
        .merge(white_label::routes());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// page/per_page query knobs shared by the paginated listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    /// Page window with defaults applied and per_page capped at 100.
    pub fn window(self) -> (i64, i64) {
        (
            self.page.unwrap_or(1).max(1),
            self.per_page.unwrap_or(20).clamp(1, 100),
        )
    }
}

/// Unwraps an optional JSON body; requests without one behave like `{}`
/// so field checks produce the field-specific 400s.
pub(crate) fn json_body(body: Option<Json<Value>>) -> Value {
    body.map(|Json(value)| value)
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
}

pub(crate) fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Client address as reported by the first X-Forwarded-For entry.
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn page_params_default_and_cap() {
        assert_eq!(PageParams::default().window(), (1, 20));
        assert_eq!(
            PageParams {
                page: Some(3),
                per_page: Some(500),
            }
            .window(),
            (3, 100)
        );
        assert_eq!(
            PageParams {
                page: Some(0),
                per_page: Some(0),
            }
            .window(),
            (1, 1)
        );
    }

    #[test]
    fn forwarded_for_takes_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.9"));

        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_ip(&headers), None);

        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn absent_body_reads_as_empty_object() {
        let value = json_body(None);
        assert!(value.as_object().is_some_and(|map| map.is_empty()));
    }
}
