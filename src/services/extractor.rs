// src/services/extractor.rs

//! Candidate extraction.
//!
//! Strategies are tried in the configured order. In first-match mode the first
//! strategy that yields at least one candidate (after noise filtering) wins and
//! the rest are skipped. In exhaustive mode every strategy runs and the results
//! are concatenated in strategy order.
//!
//! Feeds are only read by the feed strategy. A feed that fails to parse yields
//! nothing rather than falling back to the page strategies.

use crate::error::Result;
use crate::models::{
    Candidate, Document, ExtractionMode, ExtractorConfig, RawDocument, StrategyKind,
};
use crate::services::strategies::{self, Selectors};

/// Applies an ordered list of strategies to fetched documents.
pub struct Extractor {
    strategies: Vec<StrategyKind>,
    mode: ExtractionMode,
    min_text_chars: usize,
    anchor_pattern: String,
    class_hints: Vec<String>,
    selectors: Selectors,
}

impl Extractor {
    /// Build an extractor from configuration. Fails only if a selector does not compile.
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            strategies: config.strategies.clone(),
            mode: config.mode,
            min_text_chars: config.min_text_chars,
            anchor_pattern: config.anchor_pattern.clone(),
            class_hints: config.class_hints.clone(),
            selectors: Selectors::compile()?,
        })
    }

    /// Extract candidates from a raw document.
    pub fn extract(&self, raw: &RawDocument) -> Vec<Candidate> {
        let doc = Document::parse(raw);
        self.extract_document(&doc)
    }

    /// Extract candidates from an already parsed document.
    pub fn extract_document(&self, doc: &Document) -> Vec<Candidate> {
        let is_feed = doc.looks_like_feed();
        let mut out = Vec::new();
        for &kind in &self.strategies {
            if is_feed && kind != StrategyKind::Feed {
                continue;
            }
            let found = self.run(kind, doc);
            log::debug!("strategy {} yielded {} candidate(s)", kind, found.len());

            if found.is_empty() {
                continue;
            }
            out.extend(found);
            if self.mode == ExtractionMode::FirstMatch {
                break;
            }
        }
        out
    }

    /// Run one strategy and drop noise.
    pub fn run(&self, kind: StrategyKind, doc: &Document) -> Vec<Candidate> {
        let raw = match kind {
            StrategyKind::Feed => strategies::feed_entries(doc),
            StrategyKind::Anchor => strategies::anchors(doc, &self.selectors, &self.anchor_pattern),
            StrategyKind::Heading => strategies::headings(doc, &self.selectors),
            StrategyKind::ClassHint => {
                strategies::class_hints(doc, &self.selectors, &self.class_hints)
            }
            StrategyKind::FullText => strategies::full_text(doc),
        };
        raw.into_iter()
            .map(|mut c| {
                if c.text.trim().len() != c.text.len() {
                    c.text = c.text.trim().to_string();
                }
                c
            })
            .filter(|c| self.keep(c))
            .collect()
    }

    fn keep(&self, candidate: &Candidate) -> bool {
        !candidate.text.is_empty() && candidate.text.chars().count() >= self.min_text_chars
    }
}
