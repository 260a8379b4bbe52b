//! Social profile discovery and the aggregations behind /api/social.
//!
//! Discovery reads one fetched page three ways: platform URL patterns over
//! the raw markup, og:/twitter: meta tag contents, and anchors inside
//! social-widget class names. Follower and engagement figures are never
//! fabricated; discovered rows carry NULL metrics until filled in by hand.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::{json, Map, Value};
use url::Url;

use crate::domain::models::{DiscoveredProfile, SocialProfile};
use crate::domain::round2;
use crate::service::fetcher::PageFetcher;

const PLATFORM_NAMES: [&str; 6] = [
    "facebook",
    "twitter",
    "linkedin",
    "instagram",
    "youtube",
    "pinterest",
];

const IMPORTANT_PLATFORMS: [&str; 4] = ["facebook", "twitter", "linkedin", "instagram"];

static PROFILE_PATTERNS: Lazy<Vec<(&'static str, &'static str, Regex)>> = Lazy::new(|| {
    [
        ("facebook", "https://www.facebook.com/", r#"(?i)facebook\.com/([^/\s"']+)"#),
        ("facebook", "https://www.facebook.com/", r#"(?i)fb\.me/([^/\s"']+)"#),
        ("twitter", "https://twitter.com/", r#"(?i)twitter\.com/([^/\s"']+)"#),
        ("twitter", "https://twitter.com/", r#"(?i)t\.co/([^/\s"']+)"#),
        (
            "linkedin",
            "https://www.linkedin.com/",
            r#"(?i)linkedin\.com/company/([^/\s"']+)"#,
        ),
        (
            "linkedin",
            "https://www.linkedin.com/",
            r#"(?i)linkedin\.com/in/([^/\s"']+)"#,
        ),
        (
            "instagram",
            "https://www.instagram.com/",
            r#"(?i)instagram\.com/([^/\s"']+)"#,
        ),
        (
            "youtube",
            "https://www.youtube.com/",
            r#"(?i)youtube\.com/channel/([^/\s"']+)"#,
        ),
        (
            "youtube",
            "https://www.youtube.com/",
            r#"(?i)youtube\.com/c/([^/\s"']+)"#,
        ),
        (
            "youtube",
            "https://www.youtube.com/",
            r#"(?i)youtube\.com/user/([^/\s"']+)"#,
        ),
        (
            "pinterest",
            "https://www.pinterest.com/",
            r#"(?i)pinterest\.com/([^/\s"']+)"#,
        ),
    ]
    .into_iter()
    .map(|(platform, base, pattern)| {
        (
            platform,
            base,
            Regex::new(pattern).expect("invalid profile pattern"),
        )
    })
    .collect()
});

static WIDGET_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(social|facebook|twitter|instagram|linkedin)").expect("invalid class pattern")
});

/// What one pass over a page yields for the social analyzer: discovered
/// profiles plus the sharing-tag presence flags the recommendations need.
#[derive(Debug, Default)]
pub struct PageScan {
    pub profiles: Vec<DiscoveredProfile>,
    pub has_og_title: bool,
    pub has_og_description: bool,
    pub has_og_image: bool,
    pub has_twitter_card: bool,
}

pub struct SocialAnalyzer {
    fetcher: PageFetcher,
}

impl SocialAnalyzer {
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

    pub async fn scan(&self, url: &Url) -> crate::error::Result<PageScan> {
        let fetched = self.fetcher.fetch(url).await?;
        let scan = scan_page(&fetched.body);
        tracing::debug!(url = %url, profiles = scan.profiles.len(), "social scan finished");
        Ok(scan)
    }
}

/// Duplicate profile URLs keep their first discovery; markup patterns run
/// before meta tags, widgets last.
pub fn scan_page(html: &str) -> PageScan {
    let document = Html::parse_document(html);
    let mut profiles = Vec::new();

    for (platform, base, pattern) in PROFILE_PATTERNS.iter() {
        for caps in pattern.captures_iter(html) {
            if let Some(handle) = caps.get(1) {
                profiles.push(DiscoveredProfile {
                    platform: (*platform).to_string(),
                    profile_url: format!("{base}{}", handle.as_str()),
                    username: Some(handle.as_str().to_string()),
                    discovered_via: "html_link".to_string(),
                });
            }
        }
    }

    for content in social_meta_contents(&document) {
        let platform = if content.contains("facebook.com") {
            Some("facebook")
        } else if content.contains("twitter.com") {
            Some("twitter")
        } else {
            None
        };
        if let Some(platform) = platform {
            profiles.push(DiscoveredProfile {
                platform: platform.to_string(),
                username: last_segment(&content),
                profile_url: content,
                discovered_via: "meta_tag".to_string(),
            });
        }
    }

    for href in widget_hrefs(&document) {
        let lower = href.to_lowercase();
        for platform in PLATFORM_NAMES {
            if lower.contains(platform) {
                profiles.push(DiscoveredProfile {
                    platform: platform.to_string(),
                    username: last_segment(&href),
                    profile_url: href.clone(),
                    discovered_via: "widget".to_string(),
                });
            }
        }
    }

    let mut seen = HashSet::new();
    profiles.retain(|profile| seen.insert(profile.profile_url.clone()));

    PageScan {
        has_og_title: has_tag_content(&document, TagAttr::Property, "og:title"),
        has_og_description: has_tag_content(&document, TagAttr::Property, "og:description"),
        has_og_image: has_tag_content(&document, TagAttr::Property, "og:image"),
        has_twitter_card: has_tag_content(&document, TagAttr::Name, "twitter:card"),
        profiles,
    }
}

enum TagAttr {
    Property,
    Name,
}

fn has_tag_content(document: &Html, attr: TagAttr, key: &str) -> bool {
    static PROPERTY: OnceLock<Selector> = OnceLock::new();
    static NAME: OnceLock<Selector> = OnceLock::new();

    let (selector, attr_name) = match attr {
        TagAttr::Property => (
            PROPERTY.get_or_init(|| Selector::parse("meta[property]").unwrap()),
            "property",
        ),
        TagAttr::Name => (
            NAME.get_or_init(|| Selector::parse("meta[name]").unwrap()),
            "name",
        ),
    };

    document.select(selector).any(|el| {
        el.value().attr(attr_name) == Some(key)
            && !el.value().attr("content").unwrap_or("").is_empty()
    })
}

fn social_meta_contents(document: &Html) -> Vec<String> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("meta[property]").unwrap());

    document
        .select(selector)
        .filter(|el| {
            let property = el.value().attr("property").unwrap_or("");
            property.starts_with("og:") || property.starts_with("twitter:")
        })
        .filter_map(|el| el.value().attr("content"))
        .filter(|content| !content.is_empty())
        .map(str::to_string)
        .collect()
}

fn widget_hrefs(document: &Html) -> Vec<String> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("div, span, a").unwrap());

    document
        .select(selector)
        .filter(|el| {
            el.value()
                .attr("class")
                .is_some_and(|class| WIDGET_CLASS.is_match(class))
        })
        .filter_map(|el| el.value().attr("href"))
        .map(str::to_string)
        .collect()
}

fn last_segment(value: &str) -> Option<String> {
    value.split('/').next_back().map(str::to_string)
}

/// Sharing-tag checks, the page-derived half of the recommendations.
pub fn page_recommendations(scan: &PageScan) -> Vec<Value> {
    let mut recommendations = Vec::new();

    if !scan.has_og_title {
        recommendations.push(json!({
            "type": "missing_og_title",
            "priority": "high",
            "message": "Add Open Graph title tag for better social media sharing",
            "recommendation": "Add <meta property=\"og:title\" content=\"Your Page Title\"> to improve how your content appears when shared on social media",
        }));
    }
    if !scan.has_og_description {
        recommendations.push(json!({
            "type": "missing_og_description",
            "priority": "high",
            "message": "Add Open Graph description tag",
            "recommendation": "Add <meta property=\"og:description\" content=\"Your page description\"> to control how your content is described when shared",
        }));
    }
    if !scan.has_og_image {
        recommendations.push(json!({
            "type": "missing_og_image",
            "priority": "medium",
            "message": "Add Open Graph image tag",
            "recommendation": "Add <meta property=\"og:image\" content=\"URL to your image\"> to ensure an attractive image appears when your content is shared",
        }));
    }
    if !scan.has_twitter_card {
        recommendations.push(json!({
            "type": "missing_twitter_card",
            "priority": "medium",
            "message": "Add Twitter Card meta tags",
            "recommendation": "Add Twitter Card meta tags to optimize how your content appears on Twitter",
        }));
    }

    recommendations
}

/// Recommendations for a fresh analysis: sharing tags plus presence and
/// engagement gaps across the profile set.
pub fn analysis_recommendations(scan: &PageScan, profiles: &[SocialProfile]) -> Vec<Value> {
    let mut recommendations = page_recommendations(scan);

    let found: Vec<&str> = profiles.iter().map(|p| p.platform.as_str()).collect();
    let missing: Vec<&str> = IMPORTANT_PLATFORMS
        .into_iter()
        .filter(|platform| !found.contains(platform))
        .collect();
    if !missing.is_empty() {
        recommendations.push(json!({
            "type": "missing_social_platforms",
            "priority": "low",
            "message": format!("Consider establishing presence on: {}", missing.join(", ")),
            "recommendation": "Expand your social media presence to reach more audiences and improve brand visibility",
        }));
    }

    let low_engagement: Vec<&str> = profiles
        .iter()
        .filter(|p| matches!(p.engagement_rate, Some(rate) if rate < 2.0))
        .map(|p| p.platform.as_str())
        .collect();
    if !low_engagement.is_empty() {
        recommendations.push(json!({
            "type": "low_engagement",
            "priority": "medium",
            "message": format!(
                "Low engagement rates detected on: {}",
                low_engagement.join(", ")
            ),
            "recommendation": "Focus on creating more engaging content and interacting with your audience to improve engagement rates",
        }));
    }

    recommendations
}

/// Overall social signal score over stored profiles. Absent metrics count
/// as zero, which lands new discoveries in the lowest tiers.
pub fn social_signals(profiles: &[SocialProfile]) -> Value {
    if profiles.is_empty() {
        return json!({
            "overall_score": 0,
            "total_followers": 0,
            "average_engagement": 0,
            "platform_diversity": 0,
            "activity_level": "low",
        });
    }

    let total_followers: i64 = profiles.iter().map(|p| p.followers_count.unwrap_or(0)).sum();
    let avg_engagement = profiles
        .iter()
        .map(|p| p.engagement_rate.unwrap_or(0.0))
        .sum::<f64>()
        / profiles.len() as f64;
    let platform_count = profiles.len();

    let mut score: i64 = 0;
    score += if total_followers > 10_000 {
        40
    } else if total_followers > 1_000 {
        30
    } else if total_followers > 100 {
        20
    } else {
        10
    };
    score += if avg_engagement > 5.0 {
        30
    } else if avg_engagement > 3.0 {
        25
    } else if avg_engagement > 1.0 {
        15
    } else {
        5
    };
    score += if platform_count >= 4 {
        20
    } else if platform_count >= 3 {
        15
    } else if platform_count >= 2 {
        10
    } else {
        5
    };

    let now = Utc::now();
    let recent_posts = profiles
        .iter()
        .filter(|p| matches!(p.last_post_date, Some(date) if (now - date).num_days() <= 7))
        .count();
    let (activity_bonus, activity_level) = if recent_posts >= platform_count {
        (10, "high")
    } else if recent_posts >= platform_count / 2 {
        (7, "medium")
    } else {
        (3, "low")
    };
    score += activity_bonus;

    json!({
        "overall_score": score.min(100),
        "total_followers": total_followers,
        "average_engagement": round2(avg_engagement),
        "platform_diversity": platform_count,
        "activity_level": activity_level,
    })
}

/// Per-website metric rollup over stored profiles.
pub fn social_metrics(profiles: &[SocialProfile]) -> Value {
    if profiles.is_empty() {
        return json!({
            "total_profiles": 0,
            "total_followers": 0,
            "platforms": [],
            "engagement_summary": {},
            "growth_trends": [],
            "top_performing_platforms": [],
        });
    }

    let total_followers: i64 = profiles.iter().map(|p| p.followers_count.unwrap_or(0)).sum();
    let platforms: Vec<&str> = profiles.iter().map(|p| p.platform.as_str()).collect();

    let mut engagement_summary = Map::new();
    for profile in profiles {
        engagement_summary.insert(
            profile.platform.clone(),
            json!({
                "followers": profile.followers_count.unwrap_or(0),
                "engagement_rate": profile.engagement_rate.unwrap_or(0.0),
                "posts": profile.posts_count.unwrap_or(0),
                "verified": profile.verified,
                "last_post": profile.last_post_date.map(|d| d.to_rfc3339()),
            }),
        );
    }

    let mut ranked: Vec<&SocialProfile> = profiles.iter().collect();
    ranked.sort_by(|a, b| {
        let weight = |p: &SocialProfile| {
            p.followers_count.unwrap_or(0) as f64 * p.engagement_rate.unwrap_or(0.0)
        };
        weight(b).total_cmp(&weight(a))
    });

    json!({
        "total_profiles": profiles.len(),
        "total_followers": total_followers,
        "platforms": platforms,
        "engagement_summary": engagement_summary,
        "growth_trends": [],
        "top_performing_platforms": ranked
            .iter()
            .map(|p| json!({
                "platform": p.platform,
                "followers": p.followers_count.unwrap_or(0),
                "engagement": p.engagement_rate.unwrap_or(0.0),
            }))
            .collect::<Vec<_>>(),
    })
}

/// Follow-up actions derived from stored rows alone: presence gaps, weak
/// engagement, stale posting, and large unverified accounts.
pub fn stored_profile_recommendations(profiles: &[SocialProfile]) -> Vec<Value> {
    let mut recommendations = Vec::new();

    let existing: Vec<&str> = profiles.iter().map(|p| p.platform.as_str()).collect();
    let missing: Vec<&str> = IMPORTANT_PLATFORMS
        .into_iter()
        .filter(|platform| !existing.contains(platform))
        .collect();
    if !missing.is_empty() {
        recommendations.push(json!({
            "type": "platform_expansion",
            "priority": "medium",
            "title": "Expand Platform Presence",
            "description": format!("Consider creating profiles on: {}", missing.join(", ")),
            "action": "Create new social media profiles to reach wider audiences",
        }));
    }

    let low_engagement: Vec<&str> = profiles
        .iter()
        .filter(|p| matches!(p.engagement_rate, Some(rate) if rate > 0.0 && rate < 2.0))
        .map(|p| p.platform.as_str())
        .collect();
    if !low_engagement.is_empty() {
        recommendations.push(json!({
            "type": "engagement_improvement",
            "priority": "high",
            "title": "Improve Engagement",
            "description": format!("Low engagement detected on: {}", low_engagement.join(", ")),
            "action": "Focus on creating more engaging content and interacting with followers",
        }));
    }

    let now = Utc::now();
    let inactive: Vec<&str> = profiles
        .iter()
        .filter(|p| matches!(p.last_post_date, Some(date) if (now - date).num_days() > 30))
        .map(|p| p.platform.as_str())
        .collect();
    if !inactive.is_empty() {
        recommendations.push(json!({
            "type": "posting_frequency",
            "priority": "medium",
            "title": "Increase Posting Frequency",
            "description": format!("Inactive profiles detected on: {}", inactive.join(", ")),
            "action": "Maintain regular posting schedule to keep audience engaged",
        }));
    }

    let unverified: Vec<&str> = profiles
        .iter()
        .filter(|p| !p.verified && matches!(p.followers_count, Some(count) if count > 10_000))
        .map(|p| p.platform.as_str())
        .collect();
    if !unverified.is_empty() {
        recommendations.push(json!({
            "type": "verification",
            "priority": "low",
            "title": "Seek Verification",
            "description": format!("Large unverified profiles on: {}", unverified.join(", ")),
            "action": "Apply for verification badges to increase credibility",
        }));
    }

    recommendations
}
