// src/models/document.rs

//! Fetched documents, raw and parsed.

use scraper::Html;
use url::Url;

use crate::utils::resolve_url;

/// Bytes returned by a source fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Response body
    pub body: Vec<u8>,

    /// URL after redirects
    pub final_url: String,

    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,
}

impl RawDocument {
    pub fn new(body: impl Into<Vec<u8>>, final_url: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            final_url: final_url.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A raw document decoded and parsed once, shared by every extraction strategy.
pub struct Document {
    source: String,
    html: Html,
    base_url: Option<Url>,
    content_type: Option<String>,
}

impl Document {
    /// Decode (lossily) and parse a raw document.
    pub fn parse(raw: &RawDocument) -> Self {
        let source = String::from_utf8_lossy(&raw.body).into_owned();
        let html = Html::parse_document(&source);
        Self {
            source,
            html,
            base_url: Url::parse(&raw.final_url).ok(),
            content_type: raw.content_type.clone(),
        }
    }

    /// Decoded source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed HTML tree.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Whether the body is an RSS or Atom feed rather than a web page.
    ///
    /// XHTML pages are web pages even though they are XML.
    pub fn looks_like_feed(&self) -> bool {
        if let Some(ct) = &self.content_type {
            let ct = ct.to_ascii_lowercase();
            if !ct.contains("html")
                && (ct.contains("rss") || ct.contains("atom") || ct.contains("xml"))
            {
                return true;
            }
        }
        let head: String = self
            .source
            .trim_start_matches('\u{feff}')
            .trim_start()
            .chars()
            .take(512)
            .collect();
        let head = head.to_ascii_lowercase();
        !head.contains("<html")
            && (head.contains("<rss") || head.contains("<feed") || head.contains("<rdf:rdf"))
    }

    /// Resolve an `href` against the document URL. Fragment-only and script links yield `None`.
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        if href.to_ascii_lowercase().starts_with("javascript:") {
            return None;
        }
        match &self.base_url {
            Some(base) => Some(resolve_url(base, href)),
            None => Some(href.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_links_against_final_url() {
        let raw = RawDocument::new(
            "<html></html>",
            "https://www.binance.com/en/support/announcement/c-48",
        );
        let doc = Document::parse(&raw);
        assert_eq!(
            doc.resolve("/en/support/announcement/abc"),
            Some("https://www.binance.com/en/support/announcement/abc".to_string())
        );
        assert_eq!(doc.resolve("#top"), None);
        assert_eq!(doc.resolve("javascript:void(0)"), None);
    }

    #[test]
    fn detects_feeds() {
        let rss = RawDocument::new("<?xml version=\"1.0\"?><rss></rss>", "https://x.test/");
        assert!(Document::parse(&rss).looks_like_feed());

        let page = RawDocument::new("<!DOCTYPE html><html></html>", "https://x.test/")
            .with_content_type("text/html; charset=utf-8");
        assert!(!Document::parse(&page).looks_like_feed());

        let typed = RawDocument::new("<channel/>", "https://x.test/")
            .with_content_type("application/rss+xml");
        assert!(Document::parse(&typed).looks_like_feed());

        let xhtml = RawDocument::new(
            "<?xml version=\"1.0\"?><html xmlns=\"http://www.w3.org/1999/xhtml\"></html>",
            "https://x.test/",
        );
        assert!(!Document::parse(&xhtml).looks_like_feed());
        let xhtml = xhtml.with_content_type("application/xhtml+xml");
        assert!(!Document::parse(&xhtml).looks_like_feed());

        let bom = RawDocument::new("\u{feff}<?xml version=\"1.0\"?>\n<feed></feed>", "https://x.test/");
        assert!(Document::parse(&bom).looks_like_feed());
    }
}
