//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::StrategyKind;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Poll loop behavior
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Source fetch settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Candidate extraction settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Keyword lists and relevance gate
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Chat delivery settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Seen-store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Sources checked every cycle, in order
    #[serde(default = "defaults::sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is a configuration error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path).map_err(|e| {
            AppError::config(format!("cannot load {}: {e}", path.display()))
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    ///
    /// Recognised keys: `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`, `RSS_URL`
    /// (replaces the source list) and `CHECK_INTERVAL` (seconds).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.notifier.bot_token = Some(token.trim().to_string());
        }
        if let Some(chat_id) = lookup("TELEGRAM_CHAT_ID") {
            self.notifier.chat_id = Some(chat_id.trim().to_string());
        }
        if let Some(url) = lookup("RSS_URL") {
            let tag = self
                .sources
                .first()
                .map(|s| s.tag().to_string())
                .unwrap_or_else(|| "default".to_string());
            self.sources = vec![SourceConfig {
                name: "primary".to_string(),
                url: url.trim().to_string(),
                tag: Some(tag),
            }];
        }
        if let Some(interval) = lookup("CHECK_INTERVAL") {
            self.watcher.interval_secs = interval.trim().parse().map_err(|_| {
                AppError::config(format!("CHECK_INTERVAL is not a number: {interval:?}"))
            })?;
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.notifier.timeout_secs == 0 {
            return Err(AppError::validation("notifier.timeout_secs must be > 0"));
        }
        if self.watcher.interval_secs == 0 {
            return Err(AppError::validation("watcher.interval_secs must be > 0"));
        }
        if self.extractor.strategies.is_empty() {
            return Err(AppError::validation("extractor.strategies is empty"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }
        for source in &self.sources {
            url::Url::parse(&source.url).map_err(|e| {
                AppError::validation(format!("source '{}' has invalid url: {e}", source.name))
            })?;
        }
        if self.classifier.gate == RelevanceGate::Keyword
            && self.classifier.listing_keywords.is_empty()
            && self.classifier.secondary_keywords.is_empty()
        {
            return Err(AppError::validation(
                "No keywords defined while classifier.gate = \"keyword\"",
            ));
        }
        Ok(())
    }

    /// Check that the chat destination is configured.
    pub fn validate_notifier(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.notifier.bot_token.is_none() {
            missing.push("TELEGRAM_BOT_TOKEN");
        }
        if self.notifier.chat_id.is_none() {
            missing.push("TELEGRAM_CHAT_ID");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )))
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watcher: WatcherConfig::default(),
            http: HttpConfig::default(),
            extractor: ExtractorConfig::default(),
            classifier: ClassifierConfig::default(),
            notifier: NotifierConfig::default(),
            store: StoreConfig::default(),
            sources: defaults::sources(),
        }
    }
}

/// When the seen-store is written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PersistPolicy {
    /// Only after a cycle that produced at least one new alert
    #[default]
    OnAlert,
    /// After every cycle
    Always,
}

/// Poll loop behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Seconds between the end of one cycle and the start of the next
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Skip the remaining sources of a cycle once one yields a new relevant item
    #[serde(default = "defaults::stop_on_first_match")]
    pub stop_on_first_match: bool,

    #[serde(default)]
    pub persist: PersistPolicy,
}

impl WatcherConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            stop_on_first_match: defaults::stop_on_first_match(),
            persist: PersistPolicy::default(),
        }
    }
}

/// HTTP client settings for source fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Browser User-Agent; several sources reject anything else
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    #[serde(default = "defaults::accept")]
    pub accept: String,

    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept: defaults::accept(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// How strategy results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMode {
    /// The first strategy yielding anything wins
    #[default]
    FirstMatch,
    /// Run every strategy and concatenate
    Exhaustive,
}

/// Candidate extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default)]
    pub mode: ExtractionMode,

    /// Candidates shorter than this (in characters) are dropped as noise
    #[serde(default = "defaults::min_text_chars")]
    pub min_text_chars: usize,

    /// Path fragment identifying announcement links
    #[serde(default = "defaults::anchor_pattern")]
    pub anchor_pattern: String,

    /// Class attribute fragments marking title/news containers
    #[serde(default = "defaults::class_hints")]
    pub class_hints: Vec<String>,

    /// Strategies in priority order
    #[serde(default = "defaults::strategies")]
    pub strategies: Vec<StrategyKind>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::default(),
            min_text_chars: defaults::min_text_chars(),
            anchor_pattern: defaults::anchor_pattern(),
            class_hints: defaults::class_hints(),
            strategies: defaults::strategies(),
        }
    }
}

/// What makes a candidate worth an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RelevanceGate {
    /// At least one keyword must match
    #[default]
    Keyword,
    /// Everything is relevant; keywords only pick the tier
    All,
}

/// Keyword lists. Matching is case-insensitive substring matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Signal a new tradable asset
    #[serde(default = "defaults::listing_keywords")]
    pub listing_keywords: Vec<String>,

    /// Signal other notable announcements
    #[serde(default = "defaults::secondary_keywords")]
    pub secondary_keywords: Vec<String>,

    #[serde(default)]
    pub gate: RelevanceGate,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            listing_keywords: defaults::listing_keywords(),
            secondary_keywords: defaults::secondary_keywords(),
            gate: RelevanceGate::default(),
        }
    }
}

/// Chat delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Usually supplied through `TELEGRAM_BOT_TOKEN`
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,

    /// Usually supplied through `TELEGRAM_CHAT_ID`
    #[serde(default)]
    pub chat_id: Option<String>,

    /// Minimum spacing between two sends, in milliseconds
    #[serde(default = "defaults::send_interval")]
    pub send_interval_ms: u64,

    #[serde(default = "defaults::notify_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub disable_link_preview: bool,
}

impl NotifierConfig {
    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            bot_token: None,
            chat_id: None,
            send_interval_ms: defaults::send_interval(),
            timeout_secs: defaults::notify_timeout(),
            disable_link_preview: false,
        }
    }
}

/// How candidate text is normalized before hashing into a seen id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IdNormalization {
    /// Hash the extracted text as-is
    #[default]
    Strict,
    /// Collapse whitespace and lower-case before hashing
    Folded,
}

/// Seen-store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "defaults::store_path")]
    pub path: PathBuf,

    /// Changing this invalidates every previously persisted id
    #[serde(default)]
    pub id_normalization: IdNormalization,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: defaults::store_path(),
            id_normalization: IdNormalization::default(),
        }
    }
}

/// A polled source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    /// Display name used in logs
    pub name: String,

    pub url: String,

    /// Namespace for seen ids. Mirrors of the same feed should share a tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Seen-id namespace; falls back to the source name.
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::SourceConfig;
    use crate::models::StrategyKind;

    // Watcher defaults
    pub fn interval() -> u64 {
        30
    }
    pub fn stop_on_first_match() -> bool {
        true
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept() -> String {
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into()
    }
    pub fn accept_language() -> String {
        "en-US,en;q=0.9".into()
    }
    pub fn timeout() -> u64 {
        20
    }

    // Extractor defaults
    pub fn min_text_chars() -> usize {
        8
    }
    pub fn anchor_pattern() -> String {
        "announcement".into()
    }
    pub fn class_hints() -> Vec<String> {
        vec![
            "title".into(),
            "content".into(),
            "announcement".into(),
            "news".into(),
        ]
    }
    pub fn strategies() -> Vec<StrategyKind> {
        vec![
            StrategyKind::Feed,
            StrategyKind::Anchor,
            StrategyKind::Heading,
            StrategyKind::ClassHint,
            StrategyKind::FullText,
        ]
    }

    // Classifier defaults
    pub fn listing_keywords() -> Vec<String> {
        [
            "listing",
            "new trading",
            "adds",
            "launches",
            "will list",
            "support",
            "trading pairs",
            "opens trading",
            "available for trading",
            "上線",
            "新增",
            "支持",
            "開放交易",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn secondary_keywords() -> Vec<String> {
        [
            "futures",
            "margin",
            "spot trading",
            "airdrop",
            "promotion",
            "competition",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    // Notifier defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn send_interval() -> u64 {
        1000
    }
    pub fn notify_timeout() -> u64 {
        10
    }

    // Store defaults
    pub fn store_path() -> PathBuf {
        PathBuf::from("seen_posts.json")
    }

    // Source defaults
    pub fn sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig::new(
                "binance-new-listings",
                "https://www.binance.com/en/support/announcement/c-48?navId=48",
            )
            .with_tag("binance"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.watcher.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_source_url() {
        let mut config = Config::default();
        config.sources = vec![SourceConfig::new("broken", "not a url")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn keyword_gate_needs_keywords() {
        let mut config = Config::default();
        config.classifier.listing_keywords.clear();
        config.classifier.secondary_keywords.clear();
        assert!(config.validate().is_err());

        config.classifier.gate = RelevanceGate::All;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn notifier_settings_are_required() {
        let config = Config::default();
        let err = config.validate_notifier().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
        assert!(err.to_string().contains("TELEGRAM_CHAT_ID"));
    }

    #[test]
    fn overrides_fill_notifier_and_sources() {
        let vars = env(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-10042"),
            ("RSS_URL", "https://example.com/feed.xml"),
            ("CHECK_INTERVAL", "45"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.notifier.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.notifier.chat_id.as_deref(), Some("-10042"));
        assert_eq!(config.watcher.interval_secs, 45);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].url, "https://example.com/feed.xml");
        assert_eq!(config.sources[0].tag(), "binance");
        assert!(config.validate_notifier().is_ok());
    }

    #[test]
    fn bad_interval_override_is_a_config_error() {
        let vars = env(&[("CHECK_INTERVAL", "soon")]);
        let mut config = Config::default();
        let err = config.apply_overrides(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn parses_partial_toml() {
        let toml = r#"
            [watcher]
            interval_secs = 60
            persist = "always"

            [extractor]
            mode = "exhaustive"
            strategies = ["anchor", "full-text"]

            [[sources]]
            name = "mirror-a"
            url = "https://a.example.com/announcements"
            tag = "exchange"

            [[sources]]
            name = "mirror-b"
            url = "https://b.example.com/announcements"
            tag = "exchange"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.watcher.interval_secs, 60);
        assert_eq!(config.watcher.persist, PersistPolicy::Always);
        assert!(config.watcher.stop_on_first_match);
        assert_eq!(config.extractor.mode, ExtractionMode::Exhaustive);
        assert_eq!(
            config.extractor.strategies,
            vec![StrategyKind::Anchor, StrategyKind::FullText]
        );
        assert_eq!(config.extractor.min_text_chars, 8);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].tag(), "exchange");
        assert_eq!(config.store.path, PathBuf::from("seen_posts.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_gives_defaults_but_broken_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("watcher.toml");
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.watcher.interval_secs, 30);

        std::fs::write(&path, "[watcher\ninterval_secs = ").unwrap();
        let err = Config::load_or_default(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn source_tag_falls_back_to_name() {
        let source = SourceConfig::new("news", "https://example.com");
        assert_eq!(source.tag(), "news");
    }
}
