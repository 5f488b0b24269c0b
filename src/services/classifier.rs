// src/services/classifier.rs

//! Keyword classification of candidate titles.

use crate::models::{Candidate, ClassifiedCandidate, ClassifierConfig, RelevanceGate, Tier};

/// Verdict for one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub relevant: bool,
    /// Listing keywords first, then secondary keywords, each at most once
    pub matched_keywords: Vec<String>,
    pub tier: Tier,
}

/// Case-insensitive substring matcher over two keyword lists.
///
/// Lower-casing is ASCII only; keywords in other scripts must be supplied in
/// the form they appear in titles.
#[derive(Debug, Clone)]
pub struct Classifier {
    listing: Vec<String>,
    secondary: Vec<String>,
    gate: RelevanceGate,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            listing: normalize_keywords(&config.listing_keywords),
            secondary: normalize_keywords(&config.secondary_keywords),
            gate: config.gate,
        }
    }

    /// Classify a piece of text.
    pub fn classify(&self, text: &str) -> Classification {
        let haystack = text.to_ascii_lowercase();

        let mut matched: Vec<String> = Vec::new();
        let mut push = |kw: &String| {
            if !matched.contains(kw) {
                matched.push(kw.clone());
            }
        };

        let mut is_listing = false;
        for kw in self.listing.iter().filter(|kw| haystack.contains(kw.as_str())) {
            is_listing = true;
            push(kw);
        }
        let mut is_important = false;
        for kw in self.secondary.iter().filter(|kw| haystack.contains(kw.as_str())) {
            is_important = true;
            push(kw);
        }

        let tier = if is_listing {
            Tier::Listing
        } else if is_important {
            Tier::Important
        } else {
            Tier::Informational
        };

        let relevant = match self.gate {
            RelevanceGate::Keyword => !matched.is_empty(),
            RelevanceGate::All => true,
        };

        Classification {
            relevant,
            matched_keywords: matched,
            tier,
        }
    }

    /// Classify a candidate, returning `None` when it does not pass the relevance gate.
    pub fn classify_candidate(&self, candidate: Candidate) -> Option<ClassifiedCandidate> {
        let verdict = self.classify(&candidate.text);
        verdict.relevant.then(|| ClassifiedCandidate {
            candidate,
            matched_keywords: verdict.matched_keywords,
            tier: verdict.tier,
        })
    }
}

fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|kw| kw.trim().to_ascii_lowercase())
        .filter(|kw| !kw.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StrategyKind;

    fn classifier() -> Classifier {
        Classifier::new(&ClassifierConfig::default())
    }

    #[test]
    fn new_trading_is_a_listing() {
        let c = classifier().classify("Binance Will Open New Trading for ABC/USDT");
        assert!(c.relevant);
        assert_eq!(c.tier, Tier::Listing);
        assert!(c.matched_keywords.contains(&"new trading".to_string()));
    }

    #[test]
    fn futures_alone_is_important() {
        let c = classifier().classify("Notice on USDⓈ-M Futures Maintenance");
        assert!(c.relevant);
        assert_eq!(c.tier, Tier::Important);
        assert_eq!(c.matched_keywords, vec!["futures".to_string()]);
    }

    #[test]
    fn no_keyword_is_not_relevant() {
        let c = classifier().classify("Scheduled Wallet Maintenance Notice");
        assert!(!c.relevant);
        assert_eq!(c.tier, Tier::Informational);
        assert!(c.matched_keywords.is_empty());
    }

    #[test]
    fn all_gate_keeps_everything_as_informational() {
        let config = ClassifierConfig {
            gate: RelevanceGate::All,
            ..ClassifierConfig::default()
        };
        let c = Classifier::new(&config).classify("Scheduled Wallet Maintenance Notice");
        assert!(c.relevant);
        assert_eq!(c.tier, Tier::Informational);
    }

    #[test]
    fn listing_wins_over_secondary() {
        let c = classifier().classify("Binance Will List XYZ with Margin and Futures");
        assert_eq!(c.tier, Tier::Listing);
        assert_eq!(c.matched_keywords, vec!["will list", "futures", "margin"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let c = classifier().classify("BINANCE WILL LIST XYZ");
        assert_eq!(c.tier, Tier::Listing);
    }

    #[test]
    fn cjk_keywords_match_verbatim() {
        let c = classifier().classify("幣安將上線 XYZ");
        assert_eq!(c.tier, Tier::Listing);
        assert_eq!(c.matched_keywords, vec!["上線".to_string()]);
    }

    #[test]
    fn keywords_are_reported_once() {
        let config = ClassifierConfig {
            listing_keywords: vec!["listing".into(), "LISTING".into()],
            secondary_keywords: vec!["listing".into()],
            gate: RelevanceGate::Keyword,
        };
        let c = Classifier::new(&config).classify("New listing");
        assert_eq!(c.matched_keywords, vec!["listing".to_string()]);
    }

    #[test]
    fn classify_candidate_applies_gate() {
        let keep = Candidate::new("Binance Will List XYZ", None, StrategyKind::Anchor);
        let drop = Candidate::new("Wallet maintenance", None, StrategyKind::Anchor);
        let c = classifier();

        let kept = c.classify_candidate(keep).unwrap();
        assert_eq!(kept.tier, Tier::Listing);
        assert!(c.classify_candidate(drop).is_none());
    }
}
