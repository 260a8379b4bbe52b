//! Site-level resource probes that run next to the main page fetch.

use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::extractor::sitemap;
use crate::service::http::{create_client, ClientType};

pub const ROBOTS_PATH: &str = "/robots.txt";
pub const SITEMAP_PATHS: [&str; 2] = ["/sitemap.xml", "/sitemap_index.xml"];

/// Outcome of the robots/sitemap/compression probes.
///
/// A probe that errors reads as "absent"; probes never abort an audit.
#[derive(Debug, Clone, Default)]
pub struct SiteProbes {
    pub robots_txt_exists: bool,
    pub sitemap_exists: bool,
    pub sitemap_entries: Option<usize>,
    pub gzip_enabled: bool,
}

pub struct ResourceProbe {
    client: Client,
}

impl ResourceProbe {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Probe)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn run(&self, base: &Url) -> SiteProbes {
        let (robots, sitemap, gzip) = tokio::join!(
            self.robots_txt(base),
            self.sitemap(base),
            self.gzip_support(base),
        );

        SiteProbes {
            robots_txt_exists: robots,
            sitemap_exists: sitemap.is_some(),
            sitemap_entries: sitemap,
            gzip_enabled: gzip,
        }
    }

    pub async fn robots_txt(&self, base: &Url) -> bool {
        self.fetch_resource(base, ROBOTS_PATH).await.is_some()
    }

    /// Tries `/sitemap.xml` first, then `/sitemap_index.xml`, returning the
    /// entry count of whichever answered 200.
    pub async fn sitemap(&self, base: &Url) -> Option<usize> {
        for path in SITEMAP_PATHS {
            if let Some(body) = self.fetch_resource(base, path).await {
                return Some(sitemap::entry_count(&body));
            }
        }
        None
    }

    /// The shared clients never advertise gzip, so the page body arrives
    /// identity-encoded. This probe asks for gzip explicitly and inspects
    /// only the response headers.
    pub async fn gzip_support(&self, url: &Url) -> bool {
        let response = match self
            .client
            .get(url.clone())
            .header(ACCEPT_ENCODING, "gzip")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(%url, "gzip probe failed: {err}");
                return false;
            }
        };

        response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("gzip"))
            .unwrap_or(false)
    }

    async fn fetch_resource(&self, base: &Url, path: &str) -> Option<String> {
        let resource_url = base.join(path).ok()?;

        let response = match self.client.get(resource_url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(url = %resource_url, "probe failed: {err}");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            return None;
        }

        response.text().await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn robots_txt_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/robots.txt")
            .with_status(200)
            .with_body("User-agent: *\nDisallow:")
            .create_async()
            .await;

        let probe = ResourceProbe::new().unwrap();
        let base = Url::parse(&server.url()).unwrap();
        assert!(probe.robots_txt(&base).await);
    }

    #[tokio::test]
    async fn robots_txt_missing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/robots.txt")
            .with_status(404)
            .create_async()
            .await;

        let probe = ResourceProbe::new().unwrap();
        let base = Url::parse(&server.url()).unwrap();
        assert!(!probe.robots_txt(&base).await);
    }

    #[tokio::test]
    async fn sitemap_counts_primary_path_entries() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/sitemap.xml")
            .with_status(200)
            .with_body(
                "<urlset><url><loc>https://a.com/</loc></url>\
                 <url><loc>https://a.com/b</loc></url></urlset>",
            )
            .create_async()
            .await;

        let probe = ResourceProbe::new().unwrap();
        let base = Url::parse(&server.url()).unwrap();
        assert_eq!(probe.sitemap(&base).await, Some(2));
    }

    #[tokio::test]
    async fn sitemap_falls_back_to_index_path() {
        let mut server = mockito::Server::new_async().await;
        let _primary = server
            .mock("GET", "/sitemap.xml")
            .with_status(404)
            .create_async()
            .await;
        let _index = server
            .mock("GET", "/sitemap_index.xml")
            .with_status(200)
            .with_body("<sitemapindex><sitemap><loc>https://a.com/s1.xml</loc></sitemap></sitemapindex>")
            .create_async()
            .await;

        let probe = ResourceProbe::new().unwrap();
        let base = Url::parse(&server.url()).unwrap();
        assert_eq!(probe.sitemap(&base).await, Some(1));
    }

    #[tokio::test]
    async fn gzip_read_from_content_encoding_header() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("Content-Encoding", "gzip")
            .with_body("x")
            .create_async()
            .await;

        let probe = ResourceProbe::new().unwrap();
        let base = Url::parse(&server.url()).unwrap();
        assert!(probe.gzip_support(&base).await);
    }

    #[tokio::test]
    async fn gzip_absent_without_header() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("x")
            .create_async()
            .await;

        let probe = ResourceProbe::new().unwrap();
        let base = Url::parse(&server.url()).unwrap();
        assert!(!probe.gzip_support(&base).await);
    }

    #[tokio::test]
    async fn unreachable_host_degrades_to_absent() {
        let probe = ResourceProbe::new().unwrap();
        let base = Url::parse("http://127.0.0.1:1/").unwrap();
        let probes = probe.run(&base).await;

        assert!(!probes.robots_txt_exists);
        assert!(!probes.sitemap_exists);
        assert!(!probes.gzip_enabled);
    }
}
