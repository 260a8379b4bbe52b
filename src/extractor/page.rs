use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use url::Url;

#[derive(Debug, Clone)]
pub struct ImageElement {
    pub src: Option<String>,
    pub alt: Option<String>,
}

/// Everything the audit needs from one HTML page, extracted eagerly.
///
/// `scraper::Html` is not `Send`, so the parse happens once up front and the
/// result is a plain struct that can cross `.await` points.
#[derive(Debug, Clone, Default)]
pub struct PageDocument {
    /// `None` when the tag is absent; `Some("")` when present but blank.
    pub title: Option<String>,
    /// Same missing-vs-empty distinction as `title`.
    pub meta_description: Option<String>,
    pub canonical_url: Option<String>,
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub h3_tags: Vec<String>,
    pub images: Vec<ImageElement>,
    pub links: Vec<String>,
    pub word_count: i64,
    pub has_viewport_meta: bool,
    pub open_graph: Vec<(String, Option<String>)>,
    pub twitter_tags: Vec<(String, Option<String>)>,
    /// Count of `<script type="application/ld+json">` tags, parseable or not.
    pub json_ld_scripts: i64,
    pub json_ld: Vec<Value>,
    pub microdata_count: i64,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        let doc = Html::parse_document(html);
        let (json_ld_scripts, json_ld) = extract_json_ld(&doc);

        PageDocument {
            title: extract_title(&doc),
            meta_description: extract_meta_description(&doc),
            canonical_url: extract_canonical(&doc),
            h1_tags: extract_headings(&doc, HeadingLevel::H1),
            h2_tags: extract_headings(&doc, HeadingLevel::H2),
            h3_tags: extract_headings(&doc, HeadingLevel::H3),
            images: extract_images(&doc),
            links: extract_link_hrefs(&doc),
            word_count: count_words(&doc),
            has_viewport_meta: has_viewport_meta(&doc),
            open_graph: extract_open_graph(&doc),
            twitter_tags: extract_twitter_tags(&doc),
            json_ld_scripts,
            json_ld,
            microdata_count: count_microdata(&doc),
        }
    }

    pub fn images_count(&self) -> i64 {
        self.images.len() as i64
    }

    /// Blank alt text counts as missing, same as an absent attribute.
    pub fn images_without_alt(&self) -> i64 {
        self.images
            .iter()
            .filter(|img| img.alt.as_deref().map(str::trim).unwrap_or("").is_empty())
            .count() as i64
    }

    /// Splits anchors into (internal, external) against the audited authority.
    ///
    /// Absolute links compare host and port, root-relative paths are internal,
    /// fragments and non-http schemes are skipped.
    pub fn link_counts(&self, authority: &str) -> (i64, i64) {
        let mut internal = 0;
        let mut external = 0;

        for href in &self.links {
            if href.starts_with("http") {
                match Url::parse(href) {
                    Ok(link) => {
                        if url_authority(&link).as_deref() == Some(authority) {
                            internal += 1;
                        } else {
                            external += 1;
                        }
                    }
                    Err(_) => external += 1,
                }
            } else if href.starts_with('/') {
                internal += 1;
            }
        }

        (internal, external)
    }

    /// Structured-data summary; sections appear only when the page has them.
    pub fn schema_markup(&self) -> Value {
        let mut map = serde_json::Map::new();
        if self.json_ld_scripts > 0 {
            map.insert("json_ld".to_string(), Value::Array(self.json_ld.clone()));
        }
        if self.microdata_count > 0 {
            map.insert("microdata".to_string(), json!(self.microdata_count));
        }
        Value::Object(map)
    }

    /// Social meta tags grouped by family, with the `og:`/`twitter:` prefixes
    /// stripped from the keys.
    pub fn social_tags(&self) -> Value {
        let mut map = serde_json::Map::new();
        if !self.open_graph.is_empty() {
            map.insert(
                "open_graph".to_string(),
                stripped_tag_map(&self.open_graph, "og:"),
            );
        }
        if !self.twitter_tags.is_empty() {
            map.insert(
                "twitter".to_string(),
                stripped_tag_map(&self.twitter_tags, "twitter:"),
            );
        }
        Value::Object(map)
    }

    pub fn social_tag(&self, key: &str) -> Option<&str> {
        self.open_graph
            .iter()
            .chain(self.twitter_tags.iter())
            .find(|(name, _)| name == key)
            .and_then(|(_, content)| content.as_deref())
    }
}

/// `host[:port]`, matching what URL parsers call the netloc minus credentials.
pub fn url_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn stripped_tag_map(tags: &[(String, Option<String>)], prefix: &str) -> Value {
    let mut map = serde_json::Map::new();
    for (name, content) in tags {
        let key = name.strip_prefix(prefix).unwrap_or(name).to_string();
        map.insert(key, json!(content.clone().unwrap_or_default()));
    }
    Value::Object(map)
}

enum HeadingLevel {
    H1,
    H2,
    H3,
}

fn extract_title(html: &Html) -> Option<String> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("title").unwrap());
    html.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

fn extract_meta_description(html: &Html) -> Option<String> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("meta[name='description']").unwrap());
    html.select(selector)
        .next()
        .map(|el| el.value().attr("content").unwrap_or("").trim().to_string())
}

fn extract_canonical(html: &Html) -> Option<String> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("link[rel='canonical']").unwrap());
    html.select(selector)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|s| s.to_string())
}

/// Heading counts include tags with no text, so empties stay in the list.
fn extract_headings(html: &Html, level: HeadingLevel) -> Vec<String> {
    static H1: OnceLock<Selector> = OnceLock::new();
    static H2: OnceLock<Selector> = OnceLock::new();
    static H3: OnceLock<Selector> = OnceLock::new();

    let selector = match level {
        HeadingLevel::H1 => H1.get_or_init(|| Selector::parse("h1").unwrap()),
        HeadingLevel::H2 => H2.get_or_init(|| Selector::parse("h2").unwrap()),
        HeadingLevel::H3 => H3.get_or_init(|| Selector::parse("h3").unwrap()),
    };

    html.select(selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect()
}

fn extract_images(html: &Html) -> Vec<ImageElement> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("img").unwrap());

    html.select(selector)
        .map(|el| ImageElement {
            src: el.value().attr("src").map(|s| s.trim().to_string()),
            alt: el.value().attr("alt").map(|s| s.to_string()),
        })
        .collect()
}

fn extract_link_hrefs(html: &Html) -> Vec<String> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap());

    html.select(selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

fn count_words(html: &Html) -> i64 {
    static WORD: OnceLock<Regex> = OnceLock::new();
    let word = WORD.get_or_init(|| Regex::new(r"\b\w+\b").unwrap());
    let text = html.root_element().text().collect::<String>();
    word.find_iter(&text).count() as i64
}

fn has_viewport_meta(html: &Html) -> bool {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("meta[name='viewport']").unwrap());
    html.select(selector).next().is_some()
}

fn extract_open_graph(html: &Html) -> Vec<(String, Option<String>)> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("meta[property]").unwrap());

    html.select(selector)
        .filter_map(|el| {
            let property = el.value().attr("property")?;
            if !property.starts_with("og:") {
                return None;
            }
            let content = el.value().attr("content").map(|s| s.to_string());
            Some((property.to_string(), content))
        })
        .collect()
}

fn extract_twitter_tags(html: &Html) -> Vec<(String, Option<String>)> {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("meta[name]").unwrap());

    html.select(selector)
        .filter_map(|el| {
            let name = el.value().attr("name")?;
            if !name.starts_with("twitter:") {
                return None;
            }
            let content = el.value().attr("content").map(|s| s.to_string());
            Some((name.to_string(), content))
        })
        .collect()
}

/// Unparseable JSON-LD blocks are skipped rather than failing the page; the
/// script count still includes them.
fn extract_json_ld(html: &Html) -> (i64, Vec<Value>) {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector =
        SELECTOR.get_or_init(|| Selector::parse("script[type='application/ld+json']").unwrap());

    let mut scripts = 0;
    let mut parsed = Vec::new();
    for el in html.select(selector) {
        scripts += 1;
        let raw = el.text().collect::<String>();
        if let Ok(value) = serde_json::from_str::<Value>(&raw) {
            parsed.push(value);
        }
    }
    (scripts, parsed)
}

fn count_microdata(html: &Html) -> i64 {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    let selector = SELECTOR.get_or_init(|| Selector::parse("[itemscope]").unwrap());
    html.select(selector).count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_distinguishes_missing_from_empty() {
        let missing = PageDocument::parse("<html><head></head><body></body></html>");
        assert_eq!(missing.title, None);

        let empty = PageDocument::parse("<html><head><title>  </title></head></html>");
        assert_eq!(empty.title, Some(String::new()));

        let present = PageDocument::parse("<html><head><title> Hi </title></head></html>");
        assert_eq!(present.title, Some("Hi".to_string()));
    }

    #[test]
    fn meta_description_without_content_is_empty_not_missing() {
        let page = PageDocument::parse(r#"<head><meta name="description"></head>"#);
        assert_eq!(page.meta_description, Some(String::new()));

        let absent = PageDocument::parse("<head></head>");
        assert_eq!(absent.meta_description, None);
    }

    #[test]
    fn heading_counts_include_empty_tags() {
        let page = PageDocument::parse("<body><h1>One</h1><h1></h1><h2>Sub</h2></body>");
        assert_eq!(page.h1_tags.len(), 2);
        assert_eq!(page.h1_tags[0], "One");
        assert_eq!(page.h1_tags[1], "");
        assert_eq!(page.h2_tags, vec!["Sub".to_string()]);
    }

    #[test]
    fn blank_alt_counts_as_missing() {
        let page = PageDocument::parse(
            r#"<body>
                <img src="a.png" alt="A logo">
                <img src="b.png" alt="   ">
                <img src="c.png">
            </body>"#,
        );
        assert_eq!(page.images_count(), 3);
        assert_eq!(page.images_without_alt(), 2);
    }

    #[test]
    fn link_counts_split_by_authority() {
        let page = PageDocument::parse(
            r##"<body>
                <a href="https://example.com/about">about</a>
                <a href="http://other.org/">other</a>
                <a href="/contact">contact</a>
                <a href="#section">anchor</a>
                <a href="mailto:hi@example.com">mail</a>
            </body>"##,
        );
        let (internal, external) = page.link_counts("example.com");
        assert_eq!(internal, 2);
        assert_eq!(external, 1);
    }

    #[test]
    fn link_counts_respect_ports() {
        let page =
            PageDocument::parse(r#"<body><a href="https://example.com:8443/x">x</a></body>"#);
        assert_eq!(page.link_counts("example.com"), (0, 1));
        assert_eq!(page.link_counts("example.com:8443"), (1, 0));
    }

    #[test]
    fn word_count_uses_word_boundaries() {
        let page = PageDocument::parse("<body><p>Hello, world! It's 42 degrees.</p></body>");
        // hello / world / it / s / 42 / degrees
        assert_eq!(page.word_count, 6);
    }

    #[test]
    fn viewport_meta_detected() {
        let with = PageDocument::parse(
            r#"<head><meta name="viewport" content="width=device-width"></head>"#,
        );
        assert!(with.has_viewport_meta);
        assert!(!PageDocument::parse("<head></head>").has_viewport_meta);
    }

    #[test]
    fn social_and_schema_extraction() {
        let page = PageDocument::parse(
            r#"<head>
                <meta property="og:title" content="My Site">
                <meta property="og:image" content="https://example.com/x.png">
                <meta name="twitter:card" content="summary">
                <script type="application/ld+json">{"@type": "Organization"}</script>
                <script type="application/ld+json">not json</script>
            </head>
            <body><div itemscope itemtype="https://schema.org/Person"></div></body>"#,
        );

        assert_eq!(page.social_tag("og:title"), Some("My Site"));
        assert_eq!(page.social_tag("twitter:card"), Some("summary"));
        assert_eq!(page.json_ld_scripts, 2);
        assert_eq!(page.json_ld.len(), 1);
        assert_eq!(page.microdata_count, 1);

        let schema = page.schema_markup();
        assert_eq!(schema["microdata"], 1);
        assert_eq!(schema["json_ld"][0]["@type"], "Organization");

        let social = page.social_tags();
        assert_eq!(social["open_graph"]["title"], "My Site");
        assert_eq!(social["open_graph"]["image"], "https://example.com/x.png");
        assert_eq!(social["twitter"]["card"], "summary");
    }

    #[test]
    fn bare_page_yields_empty_schema_and_social_sections() {
        let page = PageDocument::parse("<html><body><p>plain</p></body></html>");
        assert_eq!(page.schema_markup(), serde_json::json!({}));
        assert_eq!(page.social_tags(), serde_json::json!({}));
    }
}
