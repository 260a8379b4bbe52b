use std::time::Instant;

use reqwest::header::HeaderMap;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::service::http::{create_client, ClientType};

/// A fully downloaded page plus timing and response metadata.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: Url,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
    pub body_bytes: usize,
    pub load_time_ms: i64,
}

impl FetchedPage {
    pub fn page_size_kb(&self) -> f64 {
        (self.body_bytes as f64 / 1024.0 * 100.0).round() / 100.0
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Page)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Downloads the page, timing the complete body read.
    ///
    /// Transport errors and non-success statuses abort the audit; there is no
    /// partial result to score.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        let started = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::fetch(e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::fetch(e.to_string()))?;
        let load_time_ms = started.elapsed().as_millis() as i64;

        tracing::debug!(
            url = %final_url,
            bytes = bytes.len(),
            load_time_ms,
            "page fetched"
        );

        Ok(FetchedPage {
            final_url,
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            body_bytes: bytes.len(),
            load_time_ms,
        })
    }
}
