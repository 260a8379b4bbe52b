//! The individual scoring checks behind an audit.
//!
//! Each function maps one observed page fact onto a scored verdict. Length
//! limits count characters, not bytes.

use url::Url;

use super::types::{
    CheckOutcome, CATEGORY_CONTENT, CATEGORY_MOBILE, CATEGORY_PERFORMANCE, CATEGORY_SEO,
    CATEGORY_TECHNICAL,
};
use crate::domain::models::{CheckStatus, Priority};

pub const TITLE_MAX_CHARS: usize = 60;
pub const META_DESCRIPTION_MAX_CHARS: usize = 160;

pub fn title_tag(title: Option<&str>) -> CheckOutcome {
    let Some(text) = title else {
        return CheckOutcome::new(
            CATEGORY_SEO,
            "title_tag",
            CheckStatus::Fail,
            0,
            10,
            "Title tag is missing",
        )
        .recommend("Add a title tag to your page")
        .priority(Priority::Critical);
    };

    if text.is_empty() {
        return CheckOutcome::new(
            CATEGORY_SEO,
            "title_tag",
            CheckStatus::Fail,
            0,
            10,
            "Title tag is empty",
        )
        .recommend("Add a descriptive title tag to your page")
        .priority(Priority::High);
    }

    let chars = text.chars().count();
    if chars > TITLE_MAX_CHARS {
        CheckOutcome::new(
            CATEGORY_SEO,
            "title_tag",
            CheckStatus::Warning,
            7,
            10,
            format!("Title tag is too long ({chars} characters)"),
        )
        .recommend("Keep title tags under 60 characters for better display in search results")
        .priority(Priority::Medium)
    } else {
        CheckOutcome::new(
            CATEGORY_SEO,
            "title_tag",
            CheckStatus::Pass,
            10,
            10,
            format!("Title tag length is optimal ({chars} characters)"),
        )
    }
}

pub fn meta_description(description: Option<&str>) -> CheckOutcome {
    let Some(text) = description else {
        return CheckOutcome::new(
            CATEGORY_SEO,
            "meta_description",
            CheckStatus::Fail,
            0,
            10,
            "Meta description is missing",
        )
        .recommend("Add a meta description to improve click-through rates")
        .priority(Priority::High);
    };

    if text.is_empty() {
        return CheckOutcome::new(
            CATEGORY_SEO,
            "meta_description",
            CheckStatus::Fail,
            0,
            10,
            "Meta description is empty",
        )
        .recommend("Add a compelling meta description")
        .priority(Priority::High);
    }

    let chars = text.chars().count();
    if chars > META_DESCRIPTION_MAX_CHARS {
        CheckOutcome::new(
            CATEGORY_SEO,
            "meta_description",
            CheckStatus::Warning,
            7,
            10,
            format!("Meta description is too long ({chars} characters)"),
        )
        .recommend("Keep meta descriptions under 160 characters")
        .priority(Priority::Medium)
    } else {
        CheckOutcome::new(
            CATEGORY_SEO,
            "meta_description",
            CheckStatus::Pass,
            10,
            10,
            format!("Meta description length is optimal ({chars} characters)"),
        )
    }
}

pub fn h1_tag(count: usize) -> CheckOutcome {
    match count {
        0 => CheckOutcome::new(
            CATEGORY_SEO,
            "h1_tag",
            CheckStatus::Fail,
            0,
            10,
            "No H1 tag found",
        )
        .recommend("Add an H1 tag to clearly define the main topic of your page")
        .priority(Priority::High),
        1 => CheckOutcome::new(
            CATEGORY_SEO,
            "h1_tag",
            CheckStatus::Pass,
            10,
            10,
            "Single H1 tag found",
        ),
        n => CheckOutcome::new(
            CATEGORY_SEO,
            "h1_tag",
            CheckStatus::Warning,
            5,
            10,
            format!("Multiple H1 tags found ({n})"),
        )
        .recommend("Use only one H1 tag per page for better SEO")
        .priority(Priority::Medium),
    }
}

pub fn ssl_certificate(url: &Url) -> CheckOutcome {
    if url.scheme() == "https" {
        CheckOutcome::new(
            CATEGORY_TECHNICAL,
            "ssl_certificate",
            CheckStatus::Pass,
            10,
            10,
            "SSL certificate is present",
        )
    } else {
        CheckOutcome::new(
            CATEGORY_TECHNICAL,
            "ssl_certificate",
            CheckStatus::Fail,
            0,
            10,
            "No SSL certificate found",
        )
        .recommend("Install an SSL certificate to secure your website")
        .priority(Priority::Critical)
    }
}

pub fn robots_txt(exists: bool) -> CheckOutcome {
    if exists {
        CheckOutcome::new(
            CATEGORY_TECHNICAL,
            "robots_txt",
            CheckStatus::Pass,
            5,
            5,
            "Robots.txt file found",
        )
    } else {
        CheckOutcome::new(
            CATEGORY_TECHNICAL,
            "robots_txt",
            CheckStatus::Warning,
            0,
            5,
            "Robots.txt file not found",
        )
        .recommend("Create a robots.txt file to guide search engine crawlers")
        .priority(Priority::Medium)
    }
}

pub fn xml_sitemap(exists: bool) -> CheckOutcome {
    if exists {
        CheckOutcome::new(
            CATEGORY_TECHNICAL,
            "xml_sitemap",
            CheckStatus::Pass,
            5,
            5,
            "XML sitemap found",
        )
    } else {
        CheckOutcome::new(
            CATEGORY_TECHNICAL,
            "xml_sitemap",
            CheckStatus::Warning,
            0,
            5,
            "XML sitemap not found",
        )
        .recommend("Create an XML sitemap to help search engines index your content")
        .priority(Priority::Medium)
    }
}

/// A page with no images is informational, not a fault.
pub fn image_alt_attributes(images: i64, missing_alt: i64) -> CheckOutcome {
    if images == 0 {
        CheckOutcome::new(
            CATEGORY_CONTENT,
            "image_alt_attributes",
            CheckStatus::Info,
            5,
            5,
            "No images found on page",
        )
    } else if missing_alt == 0 {
        CheckOutcome::new(
            CATEGORY_CONTENT,
            "image_alt_attributes",
            CheckStatus::Pass,
            10,
            10,
            "All images have alt attributes",
        )
    } else {
        CheckOutcome::new(
            CATEGORY_CONTENT,
            "image_alt_attributes",
            CheckStatus::Warning,
            5,
            10,
            format!("{missing_alt} out of {images} images missing alt attributes"),
        )
        .recommend("Add descriptive alt attributes to all images for better accessibility and SEO")
        .priority(Priority::Medium)
    }
}

pub fn content_length(word_count: i64) -> CheckOutcome {
    if word_count < 300 {
        CheckOutcome::new(
            CATEGORY_CONTENT,
            "content_length",
            CheckStatus::Warning,
            3,
            10,
            format!("Content is quite short ({word_count} words)"),
        )
        .recommend("Consider adding more comprehensive content (aim for 300+ words)")
        .priority(Priority::Medium)
    } else if word_count < 500 {
        CheckOutcome::new(
            CATEGORY_CONTENT,
            "content_length",
            CheckStatus::Pass,
            7,
            10,
            format!("Content length is adequate ({word_count} words)"),
        )
        .recommend("Consider expanding content for better SEO value")
    } else {
        CheckOutcome::new(
            CATEGORY_CONTENT,
            "content_length",
            CheckStatus::Pass,
            10,
            10,
            format!("Content length is good ({word_count} words)"),
        )
    }
}

pub fn page_load_time(load_time_ms: i64) -> CheckOutcome {
    if load_time_ms < 1000 {
        CheckOutcome::new(
            CATEGORY_PERFORMANCE,
            "page_load_time",
            CheckStatus::Pass,
            10,
            10,
            format!("Page loads quickly ({load_time_ms}ms)"),
        )
    } else if load_time_ms < 3000 {
        CheckOutcome::new(
            CATEGORY_PERFORMANCE,
            "page_load_time",
            CheckStatus::Warning,
            7,
            10,
            format!("Page load time is acceptable ({load_time_ms}ms)"),
        )
        .recommend("Consider optimizing images and scripts to improve load time")
        .priority(Priority::Medium)
    } else {
        CheckOutcome::new(
            CATEGORY_PERFORMANCE,
            "page_load_time",
            CheckStatus::Fail,
            3,
            10,
            format!("Page loads slowly ({load_time_ms}ms)"),
        )
        .recommend("Optimize images, enable compression, and minimize scripts")
        .priority(Priority::High)
    }
}

pub fn gzip_compression(enabled: bool) -> CheckOutcome {
    if enabled {
        CheckOutcome::new(
            CATEGORY_PERFORMANCE,
            "gzip_compression",
            CheckStatus::Pass,
            5,
            5,
            "GZIP compression is enabled",
        )
    } else {
        CheckOutcome::new(
            CATEGORY_PERFORMANCE,
            "gzip_compression",
            CheckStatus::Fail,
            0,
            5,
            "GZIP compression is not enabled",
        )
        .recommend("Enable GZIP compression to reduce page size")
        .priority(Priority::Medium)
    }
}

pub fn viewport_meta_tag(present: bool) -> CheckOutcome {
    if present {
        CheckOutcome::new(
            CATEGORY_MOBILE,
            "viewport_meta_tag",
            CheckStatus::Pass,
            10,
            10,
            "Viewport meta tag is present",
        )
    } else {
        CheckOutcome::new(
            CATEGORY_MOBILE,
            "viewport_meta_tag",
            CheckStatus::Fail,
            0,
            10,
            "Viewport meta tag is missing",
        )
        .recommend("Add a viewport meta tag for mobile responsiveness")
        .priority(Priority::High)
    }
}
