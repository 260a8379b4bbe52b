//! Deep security analysis behind the /api/security endpoints: SSL posture,
//! response header grading, content heuristics, and privacy signals.
//!
//! Scan-engine and blacklist verdicts are static clean entries; the real
//! signal comes from the page itself. Certificate introspection is out of
//! reach of the HTTP client, so a completed https fetch is what proves TLS.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Map, Value};
use url::Url;

use crate::domain::models::SecurityScan;
use crate::domain::round1;
use crate::error::AppError;
use crate::service::fetcher::{FetchedPage, PageFetcher};

struct HeaderSpec {
    key: &'static str,
    name: &'static str,
    importance: &'static str,
    description: &'static str,
}

const HEADER_CATALOG: [HeaderSpec; 7] = [
    HeaderSpec {
        key: "strict-transport-security",
        name: "HTTP Strict Transport Security (HSTS)",
        importance: "high",
        description: "Enforces secure HTTPS connections",
    },
    HeaderSpec {
        key: "content-security-policy",
        name: "Content Security Policy (CSP)",
        importance: "high",
        description: "Prevents XSS and code injection attacks",
    },
    HeaderSpec {
        key: "x-frame-options",
        name: "X-Frame-Options",
        importance: "medium",
        description: "Prevents clickjacking attacks",
    },
    HeaderSpec {
        key: "x-content-type-options",
        name: "X-Content-Type-Options",
        importance: "medium",
        description: "Prevents MIME type sniffing",
    },
    HeaderSpec {
        key: "x-xss-protection",
        name: "X-XSS-Protection",
        importance: "low",
        description: "Legacy XSS protection (deprecated but still useful)",
    },
    HeaderSpec {
        key: "referrer-policy",
        name: "Referrer Policy",
        importance: "low",
        description: "Controls referrer information sent with requests",
    },
    HeaderSpec {
        key: "permissions-policy",
        name: "Permissions Policy",
        importance: "medium",
        description: "Controls browser feature permissions",
    },
];

const BLACKLIST_SOURCES: [&str; 4] = [
    "google_safe_browsing",
    "phishtank",
    "malware_domain_list",
    "spamhaus",
];

const PRIVACY_KEYWORDS: [&str; 4] = [
    "privacy policy",
    "privacy notice",
    "data protection",
    "cookie policy",
];

const GDPR_INDICATORS: [&str; 6] = [
    "gdpr",
    "general data protection regulation",
    "cookie consent",
    "data subject rights",
    "right to be forgotten",
    "data controller",
];

const SENSITIVE_INPUTS: [&str; 6] = ["email", "password", "tel", "credit", "ssn", "phone"];

pub struct SecurityAnalyzer {
    fetcher: PageFetcher,
}

impl SecurityAnalyzer {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            fetcher: PageFetcher::with_client(client),
        }
    }

    /// Full scan. An unreachable site degrades each section to an
    /// error-carrying fallback instead of failing the whole analysis.
    pub async fn analyze(&self, url: &Url) -> Value {
        let fetched = self.fetcher.fetch(url).await;

        let (security_headers, malware_scan, vulnerability_scan, privacy_analysis) = match &fetched
        {
            Ok(page) => (
                analyze_headers(page),
                scan_for_malware(page),
                scan_vulnerabilities(url, page),
                analyze_privacy(page),
            ),
            Err(err) => (
                headers_unavailable(err),
                malware_unavailable(err),
                vulnerabilities_unavailable(err),
                privacy_unavailable(err),
            ),
        };
        let ssl_analysis = ssl_analysis(url, fetched.as_ref());
        let blacklist_check = check_blacklists();

        let overall_score = overall_security_score(
            &ssl_analysis,
            &security_headers,
            &malware_scan,
            &blacklist_check,
            &vulnerability_scan,
        );
        let recommendations =
            security_recommendations(&ssl_analysis, &security_headers, &vulnerability_scan);

        tracing::info!(url = %url, overall_score, "security analysis finished");

        json!({
            "ssl_analysis": ssl_analysis,
            "security_headers": security_headers,
            "malware_scan": malware_scan,
            "blacklist_check": blacklist_check,
            "vulnerability_scan": vulnerability_scan,
            "privacy_analysis": privacy_analysis,
            "overall_score": overall_score,
            "recommendations": recommendations,
            "analysis_date": Utc::now().to_rfc3339(),
        })
    }

    pub async fn ssl_check(&self, url: &Url) -> Value {
        let fetched = self.fetcher.fetch(url).await;
        ssl_analysis(url, fetched.as_ref())
    }

    pub async fn headers_check(&self, url: &Url) -> Value {
        match self.fetcher.fetch(url).await {
            Ok(page) => analyze_headers(&page),
            Err(err) => headers_unavailable(&err),
        }
    }

    pub async fn malware_scan(&self, url: &Url) -> Value {
        match self.fetcher.fetch(url).await {
            Ok(page) => scan_for_malware(&page),
            Err(err) => malware_unavailable(&err),
        }
    }

    pub async fn vulnerability_scan(&self, url: &Url) -> Value {
        match self.fetcher.fetch(url).await {
            Ok(page) => scan_vulnerabilities(url, &page),
            Err(err) => vulnerabilities_unavailable(&err),
        }
    }

    pub async fn privacy_analysis(&self, url: &Url) -> Value {
        match self.fetcher.fetch(url).await {
            Ok(page) => analyze_privacy(&page),
            Err(err) => privacy_unavailable(&err),
        }
    }
}

/// Persisted row distilled from a full `analyze` payload.
pub fn scan_record(audit_id: &str, analysis: &Value) -> SecurityScan {
    let ssl = &analysis["ssl_analysis"];
    let certificate = match &ssl["certificate"] {
        Value::Null => json!({}),
        other => other.clone(),
    };

    SecurityScan {
        audit_id: audit_id.to_string(),
        ssl_certificate: certificate,
        ssl_grade: ssl["grade"].as_str().map(str::to_string),
        ssl_expires_at: None,
        malware_detected: analysis["malware_scan"]["malware_detected"]
            .as_bool()
            .unwrap_or(false),
        blacklist_status: analysis["blacklist_check"].clone(),
        security_headers: analysis["security_headers"]["headers"].clone(),
        vulnerabilities: analysis["vulnerability_scan"]["vulnerabilities"].clone(),
        security_score: analysis["overall_score"].as_f64().unwrap_or(0.0),
        scan_timestamp: Utc::now(),
    }
}

/// Follow-up actions derived from a stored scan row.
pub fn stored_scan_recommendations(scan: &SecurityScan) -> Vec<Value> {
    let mut recommendations = Vec::new();

    if let Some(grade) = scan.ssl_grade.as_deref() {
        if matches!(grade, "C" | "D" | "F") {
            let priority = if grade == "F" { "high" } else { "medium" };
            recommendations.push(json!({
                "type": "ssl_improvement",
                "priority": priority,
                "title": "Improve SSL Configuration",
                "description": format!("Current SSL grade: {grade}"),
                "action": "Update SSL configuration to use modern protocols and cipher suites",
            }));
        }
    }

    if scan.malware_detected {
        recommendations.push(json!({
            "type": "malware_cleanup",
            "priority": "critical",
            "title": "Malware Detected",
            "description": "Malicious content found on your website",
            "action": "Immediately clean infected files and scan for vulnerabilities",
        }));
    }

    let important_headers = [
        "strict-transport-security",
        "content-security-policy",
        "x-frame-options",
        "x-content-type-options",
    ];
    let missing: Vec<&str> = important_headers
        .into_iter()
        .filter(|header| scan.security_headers.get(header).is_none())
        .collect();
    if !missing.is_empty() {
        recommendations.push(json!({
            "type": "security_headers",
            "priority": "medium",
            "title": "Add Security Headers",
            "description": format!("Missing headers: {}", missing.join(", ")),
            "action": "Implement missing security headers to improve protection",
        }));
    }

    let high_severity = scan
        .vulnerabilities
        .as_array()
        .map(|vulns| {
            vulns
                .iter()
                .filter(|v| v["severity"].as_str() == Some("high"))
                .count()
        })
        .unwrap_or(0);
    if high_severity > 0 {
        recommendations.push(json!({
            "type": "vulnerability_fix",
            "priority": "high",
            "title": "Fix High Severity Vulnerabilities",
            "description": format!("{high_severity} high severity issues found"),
            "action": "Address high severity vulnerabilities immediately",
        }));
    }

    recommendations
}

fn ssl_analysis(url: &Url, fetch: Result<&FetchedPage, &AppError>) -> Value {
    if url.scheme() != "https" {
        return json!({
            "enabled": false,
            "grade": "F",
            "score": 0,
            "issues": ["SSL not enabled - site uses HTTP instead of HTTPS"],
            "certificate": null,
            "protocol": null,
            "cipher_suite": null,
        });
    }

    match fetch {
        Ok(_) => json!({
            "enabled": true,
            "grade": "A+",
            "score": 100,
            "issues": [],
            "certificate": null,
            "protocol": null,
            "cipher_suite": null,
        }),
        Err(err) => json!({
            "enabled": false,
            "grade": "F",
            "score": 0,
            "issues": [format!("SSL analysis failed: {err}")],
            "certificate": null,
            "protocol": null,
            "cipher_suite": null,
        }),
    }
}

fn header_max_score(importance: &str) -> f64 {
    match importance {
        "high" => 20.0,
        "medium" => 15.0,
        _ => 10.0,
    }
}

fn score_header_value(key: &str, value: &str, max: f64) -> f64 {
    if key == "strict-transport-security" {
        if value.contains("max-age") && value.contains("includeSubDomains") {
            max
        } else if value.contains("max-age") {
            max * 0.8
        } else {
            max * 0.5
        }
    } else {
        max
    }
}

fn header_value_analysis(key: &str, value: &str) -> String {
    if key == "strict-transport-security" {
        if !value.contains("max-age") {
            "HSTS header missing max-age directive".to_string()
        } else if !value.contains("includeSubDomains") {
            "HSTS header should include includeSubDomains".to_string()
        } else {
            "HSTS header properly configured".to_string()
        }
    } else {
        format!("{key} header present")
    }
}

fn analyze_headers(fetched: &FetchedPage) -> Value {
    let mut headers = Map::new();
    let mut total = 0.0;
    let mut possible = 0.0;
    let mut recommendations = Vec::new();

    for spec in &HEADER_CATALOG {
        let max = header_max_score(spec.importance);
        possible += max;

        match fetched.header(spec.key) {
            Some(value) => {
                let score = score_header_value(spec.key, value, max);
                total += score;
                headers.insert(
                    spec.key.to_string(),
                    json!({
                        "present": true,
                        "value": value,
                        "score": score,
                        "max_score": max,
                        "analysis": header_value_analysis(spec.key, value),
                    }),
                );
            }
            None => {
                headers.insert(
                    spec.key.to_string(),
                    json!({
                        "present": false,
                        "value": null,
                        "score": 0,
                        "max_score": max,
                        "analysis": format!("Missing {} header", spec.name),
                    }),
                );
                recommendations.push(format!("Add {} header: {}", spec.name, spec.description));
            }
        }
    }

    json!({
        "overall_score": round1(total / possible * 100.0),
        "headers": headers,
        "recommendations": recommendations,
    })
}

fn headers_unavailable(err: &AppError) -> Value {
    json!({
        "overall_score": 0,
        "headers": {},
        "recommendations": [format!("Failed to analyze security headers: {err}")],
    })
}

static SUSPICIOUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)eval\s*\(",
        r"(?i)document\.write\s*\(",
        r"(?i)fromCharCode",
        r"(?i)unescape\s*\(",
        r#"(?i)<script[^>]*src=["'][^"']*[^a-zA-Z0-9\-\._/]["']"#,
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("invalid suspicious-content pattern"))
    .collect()
});

static EXTERNAL_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src=["']https?://[^"']*["']"#).expect("invalid resource pattern"));

static IFRAME_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<iframe[^>]*>").expect("invalid iframe pattern"));

fn scan_for_malware(fetched: &FetchedPage) -> Value {
    let content = &fetched.body;

    let suspicious_scripts: usize = SUSPICIOUS_PATTERNS
        .iter()
        .map(|re| re.find_iter(content).count())
        .sum();
    let external_resources = EXTERNAL_SRC.find_iter(content).count();
    let iframe_count = IFRAME_TAG.find_iter(content).count();
    let suspicious_content = suspicious_scripts > 5 || external_resources > 20;

    let now = Utc::now().to_rfc3339();
    json!({
        "malware_detected": false,
        "phishing_detected": false,
        "suspicious_content": suspicious_content,
        "blacklisted": false,
        "scan_engines": {
            "google_safe_browsing": {"status": "clean", "last_scan": now},
            "virustotal": {"status": "clean", "detections": 0, "total_engines": 70},
            "phishtank": {"status": "clean", "verified": false},
            "urlvoid": {"status": "clean", "detections": 0, "total_engines": 30},
        },
        "content_analysis": {
            "suspicious_scripts": suspicious_scripts,
            "external_resources": external_resources,
            "redirects": 0,
            "iframe_count": iframe_count,
        },
    })
}

fn malware_unavailable(err: &AppError) -> Value {
    json!({
        "malware_detected": false,
        "phishing_detected": false,
        "suspicious_content": false,
        "blacklisted": false,
        "scan_engines": {},
        "content_analysis": {},
        "error": err.to_string(),
    })
}

fn check_blacklists() -> Value {
    let now = Utc::now().to_rfc3339();
    let mut details = Map::new();
    for source in BLACKLIST_SOURCES {
        details.insert(
            source.to_string(),
            json!({"listed": false, "last_checked": now, "status": "clean"}),
        );
    }

    json!({
        "blacklisted": false,
        "clean_lists": BLACKLIST_SOURCES.len(),
        "total_lists": BLACKLIST_SOURCES.len(),
        "reputation_score": 100.0,
        "details": details,
    })
}

static SERVER_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Apache|nginx)/[\d.]+").expect("invalid server pattern"));

static HTTP_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src=["']http://[^"']*["']"#).expect("invalid http-src pattern"));

fn scan_vulnerabilities(url: &Url, fetched: &FetchedPage) -> Value {
    let mut vulnerabilities = Vec::new();
    let content_lower = fetched.body.to_lowercase();

    if let Some(server) = fetched.header("server") {
        if SERVER_VERSION.is_match(server) {
            vulnerabilities.push(json!({
                "type": "information_disclosure",
                "severity": "low",
                "description": "Server version information disclosed",
                "evidence": format!("Server header: {server}"),
                "recommendation": "Hide server version information",
            }));
        }
    }

    if url.scheme() == "https" {
        let http_resources = HTTP_SRC.find_iter(&fetched.body).count();
        if http_resources > 0 {
            vulnerabilities.push(json!({
                "type": "mixed_content",
                "severity": "medium",
                "description": "Mixed content detected (HTTPS page loading HTTP resources)",
                "evidence": format!("{http_resources} HTTP resources found"),
                "recommendation": "Use HTTPS for all resources or use protocol-relative URLs",
            }));
        }
    }

    if content_lower.contains("<script>") && content_lower.contains("user") {
        vulnerabilities.push(json!({
            "type": "potential_xss",
            "severity": "high",
            "description": "Potential XSS vulnerability detected",
            "evidence": "Unescaped script tags found in content",
            "recommendation": "Implement proper input validation and output encoding",
        }));
    }

    if fetched.header("x-frame-options").is_none() {
        vulnerabilities.push(json!({
            "type": "clickjacking",
            "severity": "medium",
            "description": "No clickjacking protection detected",
            "evidence": "Missing X-Frame-Options header",
            "recommendation": "Add X-Frame-Options: DENY or SAMEORIGIN header",
        }));
    }

    let count = |severity: &str| {
        vulnerabilities
            .iter()
            .filter(|v| v["severity"] == severity)
            .count()
    };
    json!({
        "total_vulnerabilities": vulnerabilities.len(),
        "high_severity": count("high"),
        "medium_severity": count("medium"),
        "low_severity": count("low"),
        "vulnerabilities": vulnerabilities,
    })
}

fn vulnerabilities_unavailable(err: &AppError) -> Value {
    json!({
        "total_vulnerabilities": 0,
        "high_severity": 0,
        "medium_severity": 0,
        "low_severity": 0,
        "vulnerabilities": [],
        "error": err.to_string(),
    })
}

fn analyze_privacy(fetched: &FetchedPage) -> Value {
    json!({
        "cookies": analyze_cookies(fetched),
        "tracking_scripts": detect_tracking_scripts(&fetched.body),
        "privacy_policy": check_privacy_policy(&fetched.body),
        "gdpr_compliance": check_gdpr_compliance(&fetched.body),
        "data_collection": analyze_data_collection(&fetched.body),
    })
}

fn privacy_unavailable(err: &AppError) -> Value {
    json!({
        "cookies": {},
        "tracking_scripts": {},
        "privacy_policy": {},
        "gdpr_compliance": {},
        "data_collection": {},
        "error": err.to_string(),
    })
}

fn analyze_cookies(fetched: &FetchedPage) -> Value {
    let mut details = Vec::new();
    let mut secure_cookies = 0;
    let mut httponly_cookies = 0;
    let mut samesite_cookies = 0;

    for value in fetched.headers.get_all("set-cookie") {
        let raw = match value.to_str() {
            Ok(raw) => raw,
            Err(_) => continue,
        };
        let mut parts = raw.split(';').map(str::trim);
        let name = match parts.next() {
            Some(pair) => pair.split('=').next().unwrap_or("").to_string(),
            None => continue,
        };

        let mut secure = false;
        let mut httponly = false;
        let mut samesite: Option<String> = None;
        let mut domain: Option<String> = None;
        let mut path: Option<String> = None;
        for attribute in parts {
            let (key, val) = match attribute.split_once('=') {
                Some((key, val)) => (key.trim(), Some(val.trim())),
                None => (attribute, None),
            };
            match key.to_ascii_lowercase().as_str() {
                "secure" => secure = true,
                "httponly" => httponly = true,
                "samesite" => samesite = val.map(str::to_string),
                "domain" => domain = val.map(str::to_string),
                "path" => path = val.map(str::to_string),
                _ => {}
            }
        }

        if secure {
            secure_cookies += 1;
        }
        if httponly {
            httponly_cookies += 1;
        }
        if samesite.is_some() {
            samesite_cookies += 1;
        }
        details.push(json!({
            "name": name,
            "secure": secure,
            "httponly": httponly,
            "samesite": samesite,
            "domain": domain,
            "path": path,
        }));
    }

    json!({
        "total_cookies": details.len(),
        "secure_cookies": secure_cookies,
        "httponly_cookies": httponly_cookies,
        "samesite_cookies": samesite_cookies,
        "third_party_cookies": 0,
        "details": details,
    })
}

static TRACKER_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("google_analytics", r"(?i)google-analytics\.com|gtag\("),
        ("facebook_pixel", r"(?i)facebook\.net|fbq\("),
        ("google_tag_manager", r"(?i)googletagmanager\.com"),
        ("hotjar", r"(?i)hotjar\.com"),
        ("mixpanel", r"(?i)mixpanel\.com"),
        ("segment", r"(?i)segment\.(io|com)"),
        ("intercom", r"(?i)intercom\.io"),
        ("drift", r"(?i)drift\.com"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("invalid tracker pattern")))
    .collect()
});

fn detect_tracking_scripts(content: &str) -> Value {
    let mut trackers = Map::new();
    for (name, re) in TRACKER_PATTERNS.iter() {
        let occurrences = re.find_iter(content).count();
        if occurrences > 0 {
            trackers.insert(
                (*name).to_string(),
                json!({"detected": true, "occurrences": occurrences}),
            );
        }
    }

    json!({
        "total_trackers": trackers.len(),
        "trackers": trackers,
    })
}

static PRIVACY_LINK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    PRIVACY_KEYWORDS
        .into_iter()
        .map(|keyword| {
            Regex::new(&format!(
                r#"(?i)<a[^>]*href=["']([^"']*)["'][^>]*>{keyword}</a>"#
            ))
            .expect("invalid privacy-link pattern")
        })
        .collect()
});

fn check_privacy_policy(content: &str) -> Value {
    let mut links = Vec::new();
    for re in PRIVACY_LINK_PATTERNS.iter() {
        for caps in re.captures_iter(content) {
            if let Some(href) = caps.get(1) {
                links.push(href.as_str().to_string());
            }
        }
    }

    let lower = content.to_lowercase();
    let keywords_found = PRIVACY_KEYWORDS
        .into_iter()
        .filter(|keyword| lower.contains(*keyword))
        .count();

    json!({
        "privacy_policy_found": !links.is_empty(),
        "privacy_links": links,
        "keywords_found": keywords_found,
    })
}

fn check_gdpr_compliance(content: &str) -> Value {
    let lower = content.to_lowercase();
    let indicators: Vec<&str> = GDPR_INDICATORS
        .into_iter()
        .filter(|indicator| lower.contains(*indicator))
        .collect();

    json!({
        "gdpr_indicators_found": indicators.len(),
        "indicators": indicators,
        "likely_compliant": indicators.len() >= 2,
    })
}

static INPUT_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<input[^>]*type=["']([^"']*)["'][^>]*>"#).expect("invalid input pattern")
});

fn analyze_data_collection(content: &str) -> Value {
    let input_types: Vec<String> = INPUT_TYPE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect();

    let sensitive_inputs = input_types
        .iter()
        .filter(|input| {
            let lower = input.to_lowercase();
            SENSITIVE_INPUTS.into_iter().any(|s| lower.contains(s))
        })
        .count();

    let mut unique = input_types.clone();
    unique.sort();
    unique.dedup();

    json!({
        "total_form_inputs": input_types.len(),
        "sensitive_inputs": sensitive_inputs,
        "input_types": unique,
    })
}

fn overall_security_score(
    ssl: &Value,
    headers: &Value,
    malware: &Value,
    blacklist: &Value,
    vulns: &Value,
) -> f64 {
    let mut score = 0.0;

    score += ssl["score"].as_f64().unwrap_or(0.0) / 100.0 * 30.0;
    score += headers["overall_score"].as_f64().unwrap_or(0.0) / 100.0 * 25.0;

    let malware_clean = !malware["malware_detected"].as_bool().unwrap_or(false);
    let blacklist_clean = !blacklist["blacklisted"].as_bool().unwrap_or(false);
    if malware_clean && blacklist_clean {
        score += 25.0;
    } else if malware_clean || blacklist_clean {
        score += 12.5;
    }

    let high = vulns["high_severity"].as_i64().unwrap_or(0);
    let medium = vulns["medium_severity"].as_i64().unwrap_or(0);
    if high == 0 {
        score += if medium == 0 { 20.0 } else { 15.0 };
    } else if high <= 2 {
        score += 10.0;
    } else {
        score += 5.0;
    }

    round1(score).min(100.0)
}

fn security_recommendations(ssl: &Value, headers: &Value, vulns: &Value) -> Vec<Value> {
    let mut recommendations = Vec::new();

    let enabled = ssl["enabled"].as_bool().unwrap_or(false);
    let grade = ssl["grade"].as_str().unwrap_or("");
    if !enabled {
        recommendations.push(json!({
            "type": "ssl",
            "priority": "critical",
            "title": "Enable HTTPS",
            "description": "Install an SSL certificate and redirect all HTTP traffic to HTTPS",
        }));
    } else if matches!(grade, "C" | "D" | "F") {
        recommendations.push(json!({
            "type": "ssl",
            "priority": "high",
            "title": "Improve SSL Configuration",
            "description": "Update SSL configuration to use modern protocols and cipher suites",
        }));
    }

    if let Some(header_recs) = headers["recommendations"].as_array() {
        for rec in header_recs {
            recommendations.push(json!({
                "type": "headers",
                "priority": "medium",
                "title": "Security Headers",
                "description": rec,
            }));
        }
    }

    if let Some(found) = vulns["vulnerabilities"].as_array() {
        for vuln in found {
            let severity = vuln["severity"].as_str().unwrap_or("medium");
            let priority = if severity == "high" { "high" } else { "medium" };
            recommendations.push(json!({
                "type": "vulnerability",
                "priority": priority,
                "title": title_case(vuln["type"].as_str().unwrap_or("")),
                "description": vuln["recommendation"],
            }));
        }
    }

    recommendations
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
