//! Page analysis: runs every scoring check and assembles the metric rows.

pub mod checks;
mod types;

pub use types::{
    overall_score, CheckOutcome, PageAnalysis, CATEGORY_CONTENT, CATEGORY_MOBILE,
    CATEGORY_PERFORMANCE, CATEGORY_SEO, CATEGORY_TECHNICAL,
};

use chrono::Utc;
use serde_json::{json, Value};
use url::Url;

use crate::domain::models::{PerformanceMetrics, SecurityScan, SeoMetrics};
use crate::extractor::page::{url_authority, PageDocument};
use crate::service::fetcher::FetchedPage;
use crate::service::probes::SiteProbes;

/// Response headers graded by the per-audit security snapshot.
pub const SECURITY_HEADERS: [&str; 5] = [
    "strict-transport-security",
    "content-security-policy",
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
];

pub struct PageAnalyzer;

impl PageAnalyzer {
    /// Pure assembly over already-fetched inputs; no IO happens here.
    ///
    /// `url` is the audited URL as requested, before any redirects.
    pub fn analyze(
        url: &Url,
        fetched: &FetchedPage,
        page: &PageDocument,
        probes: &SiteProbes,
    ) -> PageAnalysis {
        let domain = url_authority(url).unwrap_or_else(|| url.as_str().to_string());

        let checks = Self::run_checks(url, fetched, page, probes);
        let overall = overall_score(&checks);

        PageAnalysis {
            url: url.to_string(),
            domain: domain.clone(),
            overall_score: overall,
            seo_metrics: Self::seo_metrics(&domain, url, fetched, page, probes),
            performance: Self::performance_metrics(fetched, probes),
            security: Self::security_scan(url, fetched),
            checks,
        }
    }

    fn run_checks(
        url: &Url,
        fetched: &FetchedPage,
        page: &PageDocument,
        probes: &SiteProbes,
    ) -> Vec<CheckOutcome> {
        vec![
            checks::title_tag(page.title.as_deref()),
            checks::meta_description(page.meta_description.as_deref()),
            checks::h1_tag(page.h1_tags.len()),
            checks::ssl_certificate(url),
            checks::robots_txt(probes.robots_txt_exists),
            checks::xml_sitemap(probes.sitemap_exists),
            checks::image_alt_attributes(page.images_count(), page.images_without_alt()),
            checks::content_length(page.word_count),
            checks::page_load_time(fetched.load_time_ms),
            checks::gzip_compression(probes.gzip_enabled),
            checks::viewport_meta_tag(page.has_viewport_meta),
        ]
    }

    fn seo_metrics(
        domain: &str,
        url: &Url,
        fetched: &FetchedPage,
        page: &PageDocument,
        probes: &SiteProbes,
    ) -> SeoMetrics {
        let (internal_links, external_links) = page.link_counts(domain);

        SeoMetrics {
            audit_id: String::new(),
            page_title: page.title.clone(),
            meta_description: page.meta_description.clone(),
            h1_tags: page.h1_tags.clone(),
            h2_tags: page.h2_tags.clone(),
            h3_tags: page.h3_tags.clone(),
            images_count: page.images_count(),
            images_without_alt: page.images_without_alt(),
            internal_links,
            external_links,
            word_count: page.word_count,
            page_size_kb: fetched.page_size_kb(),
            load_time_ms: fetched.load_time_ms,
            mobile_friendly: page.has_viewport_meta,
            ssl_enabled: url.scheme() == "https",
            robots_txt_exists: probes.robots_txt_exists,
            sitemap_exists: probes.sitemap_exists,
            canonical_url: page.canonical_url.clone(),
            schema_markup: page.schema_markup(),
            social_tags: page.social_tags(),
        }
    }

    /// Paint and interactivity values are derived from the one measured load
    /// time; there is no browser trace behind them.
    fn performance_metrics(fetched: &FetchedPage, probes: &SiteProbes) -> PerformanceMetrics {
        let load = fetched.load_time_ms;

        let mut performance_score: i64 = 100;
        if load > 3000 {
            performance_score -= 30;
        } else if load > 2000 {
            performance_score -= 20;
        } else if load > 1000 {
            performance_score -= 10;
        }
        if !probes.gzip_enabled {
            performance_score -= 10;
        }
        if fetched.header("cache-control").is_none() {
            performance_score -= 10;
        }

        PerformanceMetrics {
            audit_id: String::new(),
            first_contentful_paint: load,
            largest_contentful_paint: load + 500,
            first_input_delay: 50,
            cumulative_layout_shift: 0.1,
            speed_index: load,
            time_to_interactive: load + 1000,
            total_blocking_time: 100,
            performance_score: performance_score.max(0),
            accessibility_score: 85,
            best_practices_score: 90,
            seo_score: 80,
        }
    }

    /// Quick per-audit security snapshot graded off the page response.
    ///
    /// TLS is proven by the https fetch itself, so a secure scheme grades A.
    fn security_scan(url: &Url, fetched: &FetchedPage) -> SecurityScan {
        let https = url.scheme() == "https";
        let mut score: i64 = 100;

        let ssl_grade = if https {
            "A"
        } else {
            score -= 50;
            "F"
        };

        let mut present = serde_json::Map::new();
        for name in SECURITY_HEADERS {
            match fetched.header(name) {
                Some(value) => {
                    present.insert(name.to_string(), json!(value));
                }
                None => score -= 5,
            }
        }

        SecurityScan {
            audit_id: String::new(),
            ssl_certificate: json!({}),
            ssl_grade: Some(ssl_grade.to_string()),
            ssl_expires_at: None,
            malware_detected: false,
            blacklist_status: json!({}),
            security_headers: Value::Object(present),
            vulnerabilities: json!({}),
            security_score: score.max(0) as f64,
            scan_timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn fetched(body: &str, load_time_ms: i64, headers: &[(&'static str, &str)]) -> FetchedPage {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        FetchedPage {
            final_url: Url::parse("https://example.com/").unwrap(),
            status: 200,
            headers: map,
            body: body.to_string(),
            body_bytes: body.len(),
            load_time_ms,
        }
    }

    fn healthy_page_html() -> String {
        let words = "lorem ipsum dolor sit amet ".repeat(120);
        format!(
            r#"<html><head>
                <title>A perfectly sized title for this page</title>
                <meta name="description" content="A useful description of the page.">
                <meta name="viewport" content="width=device-width">
            </head>
            <body><h1>Main topic</h1><p>{words}</p></body></html>"#
        )
    }

    fn all_probes() -> SiteProbes {
        SiteProbes {
            robots_txt_exists: true,
            sitemap_exists: true,
            sitemap_entries: Some(3),
            gzip_enabled: true,
        }
    }

    #[test]
    fn healthy_page_scores_one_hundred() {
        let url = Url::parse("https://example.com/").unwrap();
        let html = healthy_page_html();
        let page = PageDocument::parse(&html);
        let fetched = fetched(&html, 400, &[("cache-control", "max-age=60")]);

        let analysis = PageAnalyzer::analyze(&url, &fetched, &page, &all_probes());

        assert_eq!(analysis.checks.len(), 11);
        assert_eq!(analysis.overall_score, 100);
        assert_eq!(analysis.domain, "example.com");
        assert_eq!(analysis.performance.performance_score, 100);
        assert_eq!(analysis.security.ssl_grade.as_deref(), Some("A"));
    }

    #[test]
    fn failed_probes_degrade_score_without_aborting() {
        let url = Url::parse("https://example.com/").unwrap();
        let html = healthy_page_html();
        let page = PageDocument::parse(&html);
        let fetched = fetched(&html, 400, &[("cache-control", "max-age=60")]);

        let analysis = PageAnalyzer::analyze(&url, &fetched, &page, &SiteProbes::default());

        // robots 0/5, sitemap 0/5, gzip 0/5: 75 of 90 possible points
        assert_eq!(analysis.overall_score, 83);
        assert!(!analysis.seo_metrics.robots_txt_exists);
        assert!(!analysis.seo_metrics.sitemap_exists);
    }

    #[test]
    fn performance_penalties_accumulate() {
        let url = Url::parse("https://example.com/").unwrap();
        let html = healthy_page_html();
        let page = PageDocument::parse(&html);
        let slow = fetched(&html, 3500, &[]);

        let probes = SiteProbes {
            gzip_enabled: false,
            ..all_probes()
        };
        let analysis = PageAnalyzer::analyze(&url, &slow, &page, &probes);

        // -30 slow load, -10 no gzip, -10 no cache-control
        assert_eq!(analysis.performance.performance_score, 50);
        assert_eq!(analysis.performance.first_contentful_paint, 3500);
        assert_eq!(analysis.performance.largest_contentful_paint, 4000);
        assert_eq!(analysis.performance.time_to_interactive, 4500);
    }

    #[test]
    fn plain_http_grades_f_and_loses_half() {
        let url = Url::parse("http://example.com/").unwrap();
        let html = healthy_page_html();
        let page = PageDocument::parse(&html);
        let fetched = fetched(&html, 400, &[]);

        let analysis = PageAnalyzer::analyze(&url, &fetched, &page, &all_probes());

        assert_eq!(analysis.security.ssl_grade.as_deref(), Some("F"));
        // 100 - 50 ssl - 5 x 5 missing headers
        assert_eq!(analysis.security.security_score, 25.0);
        assert!(!analysis.seo_metrics.ssl_enabled);
    }

    #[test]
    fn present_security_headers_are_recorded_with_values() {
        let url = Url::parse("https://example.com/").unwrap();
        let html = healthy_page_html();
        let page = PageDocument::parse(&html);
        let fetched = fetched(
            &html,
            400,
            &[
                ("strict-transport-security", "max-age=31536000"),
                ("x-frame-options", "DENY"),
            ],
        );

        let analysis = PageAnalyzer::analyze(&url, &fetched, &page, &all_probes());

        let headers = &analysis.security.security_headers;
        assert_eq!(headers["strict-transport-security"], "max-age=31536000");
        assert_eq!(headers["x-frame-options"], "DENY");
        // 100 - 3 x 5 missing
        assert_eq!(analysis.security.security_score, 85.0);
    }

    #[test]
    fn link_and_word_metrics_flow_into_seo_row() {
        let url = Url::parse("https://example.com/").unwrap();
        let html = r#"<html><head><title>t</title></head><body>
            <h1>one</h1>
            <a href="https://example.com/a">in</a>
            <a href="/b">in</a>
            <a href="https://elsewhere.net/">out</a>
            <img src="x.png">
            <p>three words here</p>
        </body></html>"#;
        let page = PageDocument::parse(html);
        let fetched = fetched(html, 100, &[]);

        let analysis = PageAnalyzer::analyze(&url, &fetched, &page, &all_probes());

        assert_eq!(analysis.seo_metrics.internal_links, 2);
        assert_eq!(analysis.seo_metrics.external_links, 1);
        assert_eq!(analysis.seo_metrics.images_count, 1);
        assert_eq!(analysis.seo_metrics.images_without_alt, 1);
        assert_eq!(analysis.seo_metrics.h1_tags, vec!["one".to_string()]);
    }
}
