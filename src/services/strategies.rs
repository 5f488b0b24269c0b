// src/services/strategies.rs

//! Extraction strategies.
//!
//! Each strategy is a pure function from a parsed [`Document`] to candidates in
//! document order. Strategies only normalize whitespace; length filtering and
//! the fallback policy belong to the [`Extractor`](super::Extractor).

use std::fmt::Write;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Node, Selector};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Candidate, Document, StrategyKind};
use crate::utils::normalize_whitespace;

/// Elements whose text is never rendered.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that make up the entries of a list wrapper.
const BLOCK_ELEMENTS: &[&str] = &["div", "li", "p", "article", "section", "tr", "dd"];

/// Entities XML defines itself.
const XML_ENTITIES: &[&str] = &["amp", "lt", "gt", "quot", "apos"];

/// Compiled selectors shared by the HTML strategies.
#[derive(Debug)]
pub struct Selectors {
    link: Selector,
    heading: Selector,
    classed: Selector,
}

impl Selectors {
    pub fn compile() -> Result<Self> {
        Ok(Self {
            link: parse_selector("a[href]")?,
            heading: parse_selector("h1, h2, h3, h4, h5, h6")?,
            classed: parse_selector("[class]")?,
        })
    }
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Links whose target contains `pattern`; text is the link's visible text.
pub fn anchors(doc: &Document, selectors: &Selectors, pattern: &str) -> Vec<Candidate> {
    let pattern = pattern.to_ascii_lowercase();
    doc.html()
        .select(&selectors.link)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            if !href.to_ascii_lowercase().contains(&pattern) {
                return None;
            }
            Some(Candidate::new(
                element_text(&a),
                doc.resolve(href),
                StrategyKind::Anchor,
            ))
        })
        .collect()
}

/// Heading elements; the link is a contained hyperlink, else the nearest enclosing one.
pub fn headings(doc: &Document, selectors: &Selectors) -> Vec<Candidate> {
    doc.html()
        .select(&selectors.heading)
        .map(|h| {
            let href = h
                .select(&selectors.link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .or_else(|| enclosing_link(&h));
            Candidate::new(
                element_text(&h),
                href.and_then(|href| doc.resolve(href)),
                StrategyKind::Heading,
            )
        })
        .collect()
}

/// Containers whose class attribute contains any of `hints`.
///
/// Only the innermost matching containers are used. A container holding a run
/// of sibling blocks (a list wrapper) yields one candidate per block.
pub fn class_hints(doc: &Document, selectors: &Selectors, hints: &[String]) -> Vec<Candidate> {
    let hints: Vec<String> = hints.iter().map(|h| h.to_ascii_lowercase()).collect();
    let is_hinted = |el: &ElementRef| {
        !HIDDEN_ELEMENTS.contains(&el.value().name())
            && el.value().attr("class").is_some_and(|class| {
                let class = class.to_ascii_lowercase();
                hints.iter().any(|hint| class.contains(hint.as_str()))
            })
    };

    let mut out = Vec::new();
    for el in doc.html().select(&selectors.classed).filter(|el| is_hinted(el)) {
        let has_inner_match = el
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .any(|inner| is_hinted(&inner));
        if has_inner_match {
            continue;
        }

        for item in list_items(el) {
            let href = if item.value().name() == "a" {
                item.value().attr("href")
            } else {
                item.select(&selectors.link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
            };
            out.push(Candidate::new(
                element_text(&item),
                href.and_then(|href| doc.resolve(href)),
                StrategyKind::ClassHint,
            ));
        }
    }
    out
}

/// Split a list wrapper into its entries; anything else is a single entry.
fn list_items(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let has_own_text = el
        .children()
        .any(|node| matches!(node.value(), Node::Text(t) if !t.trim().is_empty()));
    if has_own_text {
        return vec![el];
    }

    let children: Vec<ElementRef> = el
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| !element_text(child).is_empty())
        .collect();
    let Some(first) = children.first() else {
        return vec![el];
    };
    let name = first.value().name();
    let repeated = children.len() > 1
        && BLOCK_ELEMENTS.contains(&name)
        && children.iter().all(|child| child.value().name() == name);

    if repeated { children } else { vec![el] }
}

/// Every visible text node, without links.
pub fn full_text(doc: &Document) -> Vec<Candidate> {
    doc.html()
        .root_element()
        .descendants()
        .filter_map(|node| {
            let Node::Text(text) = node.value() else {
                return None;
            };
            let hidden = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| HIDDEN_ELEMENTS.contains(&el.value().name()));
            if hidden {
                return None;
            }
            let text = normalize_whitespace(text);
            (!text.is_empty()).then(|| Candidate::new(text, None, StrategyKind::FullText))
        })
        .collect()
}

/// RSS 2.0 items or Atom entries. Yields nothing for web pages.
///
/// Titles are reduced to plain text. Namespaced siblings such as `<atom:link>`
/// or `<media:title>` share a field with their plain counterparts, so those
/// fields are lists and the first usable value wins.
pub fn feed_entries(doc: &Document) -> Vec<Candidate> {
    if !doc.looks_like_feed() {
        return Vec::new();
    }

    let xml = html_entities_to_numeric(doc.source().trim_start_matches('\u{feff}'));

    if let Ok(rss) = quick_xml::de::from_str::<Rss>(&xml) {
        return rss
            .channel
            .items
            .into_iter()
            .filter_map(|item| {
                let title = first_text(&item.titles)?;
                let link = rss_link(&item.links).and_then(|l| doc.resolve(&decode_entities(l)));
                let published = item.pub_date.as_deref().and_then(parse_rfc2822);
                Some(Candidate::new(title, link, StrategyKind::Feed).published(published))
            })
            .collect();
    }

    match quick_xml::de::from_str::<AtomFeed>(&xml) {
        Ok(feed) => feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let title = first_text(&entry.titles)?;
                let link = entry
                    .links
                    .iter()
                    .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                    .and_then(|l| l.href.as_deref())
                    .and_then(|href| doc.resolve(&decode_entities(href)));
                let published = entry
                    .published
                    .as_deref()
                    .or(entry.updated.as_deref())
                    .and_then(parse_rfc3339);
                Some(Candidate::new(title, link, StrategyKind::Feed).published(published))
            })
            .collect(),
        Err(e) => {
            log::warn!("document looked like a feed but did not parse: {e}");
            Vec::new()
        }
    }
}

fn element_text(el: &ElementRef) -> String {
    normalize_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// First title that is non-empty once markup and entities are stripped.
fn first_text(texts: &[FeedText]) -> Option<String> {
    texts
        .iter()
        .map(|t| plain_text(&t.value))
        .find(|t| !t.is_empty())
}

/// Markup and entities reduced to whitespace-normalized text.
fn plain_text(s: &str) -> String {
    let fragment = Html::parse_fragment(s);
    normalize_whitespace(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
}

fn decode_entities(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}

/// The element-text link of an RSS item, else an `href` link that is not `self`.
fn rss_link(links: &[RssLink]) -> Option<&str> {
    links
        .iter()
        .filter_map(|l| l.value.as_deref())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .or_else(|| {
            links
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .and_then(|l| l.href.as_deref())
        })
}

/// Rewrite HTML named entities as numeric references so the XML parser accepts them.
///
/// Unknown names and bare ampersands become `&amp;`.
fn html_entities_to_numeric(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let name_len = tail
            .bytes()
            .skip(1)
            .take(32)
            .position(|b| b == b';')
            .filter(|&n| n > 0 && tail[1..=n].bytes().all(|b| b.is_ascii_alphanumeric()));

        let Some(n) = name_len else {
            out.push_str(if tail[1..].starts_with('#') { "&" } else { "&amp;" });
            rest = &tail[1..];
            continue;
        };

        let name = &tail[1..=n];
        let entity = &tail[..n + 2];
        if XML_ENTITIES.contains(&name) {
            out.push_str(entity);
        } else {
            let decoded = html_escape::decode_html_entities(entity);
            if decoded == entity {
                out.push_str("&amp;");
                out.push_str(&entity[1..]);
            } else {
                for c in decoded.chars() {
                    let _ = write!(out, "&#x{:X};", c as u32);
                }
            }
        }
        rest = &tail[n + 2..];
    }

    out.push_str(rest);
    out
}

fn enclosing_link<'a>(el: &ElementRef<'a>) -> Option<&'a str> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
}

fn parse_rfc2822(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default, rename = "title")]
    titles: Vec<FeedText>,
    #[serde(default, rename = "link")]
    links: Vec<RssLink>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// `<link>url</link>` or `<atom:link href=".." rel=".."/>`.
#[derive(Debug, Deserialize)]
struct RssLink {
    #[serde(default, rename = "$text")]
    value: Option<String>,
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(default, rename = "entry")]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default, rename = "title")]
    titles: Vec<FeedText>,
    #[serde(default, rename = "link")]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedText {
    #[serde(default, rename = "$text")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}
