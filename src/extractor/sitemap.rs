use quick_xml::events::Event;
use url::Url;

#[derive(Debug, Clone)]
pub enum SitemapFormat {
    Xml,
    PlainText,
}

impl SitemapFormat {
    pub fn detect(text: &str) -> Self {
        match text.contains("<loc>") {
            true => SitemapFormat::Xml,
            false => SitemapFormat::PlainText,
        }
    }

    fn extract_urls(&self, text: &str) -> Vec<String> {
        match self {
            SitemapFormat::Xml => extract_from_xml(text),
            SitemapFormat::PlainText => extract_from_plain_text(text),
        }
    }
}

/// Pulls page URLs out of a sitemap body, XML `<loc>` entries or a plain
/// URL-per-line list.
pub fn extract_urls(text: &str) -> Vec<String> {
    SitemapFormat::detect(text).extract_urls(text)
}

pub fn entry_count(text: &str) -> usize {
    extract_urls(text).len()
}

fn extract_from_xml(text: &str) -> Vec<String> {
    let mut reader = quick_xml::Reader::from_str(text);
    let mut urls = Vec::new();
    let mut buf = Vec::new();
    let mut in_loc_tag = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"loc" => {
                in_loc_tag = true;
            }
            Ok(Event::Text(e)) if in_loc_tag => {
                match e.decode() {
                    Ok(txt) => urls.push(txt.trim().to_string()),
                    Err(err) => {
                        tracing::warn!(
                            position = reader.buffer_position(),
                            "skipping undecodable sitemap entry: {err}"
                        );
                    }
                }
                in_loc_tag = false;
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!("stopping sitemap parse on malformed XML: {err}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    urls
}

fn extract_from_plain_text(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|token| Url::parse(token).ok())
        .map(|url| url.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_xml_format() {
        assert!(matches!(
            SitemapFormat::detect("<loc>https://example.com</loc>"),
            SitemapFormat::Xml
        ));
        assert!(matches!(
            SitemapFormat::detect("https://example.com"),
            SitemapFormat::PlainText
        ));
    }

    #[test]
    fn extracts_urls_from_urlset() {
        let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/pricing</loc></url>
</urlset>"#;

        let urls = extract_urls(text);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[1], "https://example.com/pricing");
    }

    #[test]
    fn extracts_urls_from_sitemap_index() {
        let text = r#"<sitemapindex>
  <sitemap><loc>https://example.com/sitemap-pages.xml</loc></sitemap>
  <sitemap><loc>https://example.com/sitemap-posts.xml</loc></sitemap>
</sitemapindex>"#;

        assert_eq!(entry_count(text), 2);
    }

    #[test]
    fn falls_back_to_plain_text_lists() {
        let text = "https://example.com/a\nhttps://example.com/b\nnot a url";
        let urls = extract_urls(text);
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn empty_body_yields_no_entries() {
        assert_eq!(entry_count(""), 0);
    }
}
