use anyhow::{Context, Result};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;

/// Desktop browser UA; some origins serve crawler UAs a stripped page.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Copy)]
pub enum ClientType {
    /// Full page downloads; generous timeout for slow origins.
    Page,
    /// robots.txt, sitemap and header probes; fail fast instead.
    Probe,
}

/// Factory for creating an HTTP client tuned to the request kind.
///
/// Neither client advertises an Accept-Encoding, so page bodies arrive
/// identity-encoded with their compression headers intact.
pub fn create_client(client_type: ClientType) -> Result<Client> {
    let timeout = match client_type {
        ClientType::Page => Duration::from_secs(30),
        ClientType::Probe => Duration::from_secs(10),
    };

    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .redirect(Policy::limited(10))
        .build()
        .context("Failed to build HTTP client")
}
