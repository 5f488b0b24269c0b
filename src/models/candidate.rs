// src/models/candidate.rs

//! Per-cycle records: extracted candidates, their classification and alerts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies the extraction strategy that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// RSS / Atom entries
    Feed,
    /// Hyperlinks whose target contains the announcement path fragment
    Anchor,
    /// `h1`..`h6` elements
    Heading,
    /// Containers whose class attribute hints at a title or news item
    ClassHint,
    /// Every visible text node
    FullText,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Feed => "feed",
            StrategyKind::Anchor => "anchor",
            StrategyKind::Heading => "heading",
            StrategyKind::ClassHint => "class-hint",
            StrategyKind::FullText => "full-text",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A text fragment pulled out of a polled document, not yet judged relevant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Trimmed title or text snippet (never empty)
    pub text: String,

    /// Absolute link to the announcement, when the strategy found one
    pub link: Option<String>,

    /// Strategy that produced this candidate
    pub strategy: StrategyKind,

    /// Publish time, only known for feed entries
    pub published_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn new(text: impl Into<String>, link: Option<String>, strategy: StrategyKind) -> Self {
        Self {
            text: text.into(),
            link,
            strategy,
            published_at: None,
        }
    }

    pub fn published(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.published_at = at;
        self
    }
}

/// Priority tier of a relevant candidate. Ordered so that `Listing` is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Informational,
    Important,
    Listing,
}

impl Tier {
    pub fn emoji(&self) -> &'static str {
        match self {
            Tier::Listing => "🚀",
            Tier::Important => "⭐",
            Tier::Informational => "📢",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Listing => "listing",
            Tier::Important => "important",
            Tier::Informational => "informational",
        };
        f.write_str(name)
    }
}

/// A candidate together with the classifier's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCandidate {
    pub candidate: Candidate,

    /// Keywords found in the text, listing keywords first, without repeats
    pub matched_keywords: Vec<String>,

    pub tier: Tier,
}

/// The unit handed to the notifier.
#[derive(Debug, Clone)]
pub struct Alert {
    pub classified: ClassifiedCandidate,
    pub discovered_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(classified: ClassifiedCandidate) -> Self {
        Self {
            classified,
            discovered_at: Utc::now(),
        }
    }

    pub fn title(&self) -> &str {
        &self.classified.candidate.text
    }

    pub fn tier(&self) -> Tier {
        self.classified.tier
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.classified.candidate.published_at
    }
}
