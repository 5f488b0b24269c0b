// src/error.rs

//! Unified error handling for the watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors surfaced by startup, delivery and persistence.
///
/// Source fetch failures use [`FetchError`] instead and never reach this type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Seen-store or config file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a request failed outright
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Seen-store JSON could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file is not valid TOML
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A source or API URL does not parse
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// An extraction selector does not compile
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Missing or malformed settings, or an unreadable seen-store. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration value failed a sanity check
    #[error("Validation error: {0}")]
    Validation(String),

    /// Seen-store could not be written. The in-memory set is still authoritative.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Notification transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The poll loop cannot continue
    #[error("Loop failure: {0}")]
    Loop(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a persistence error.
    pub fn persistence(message: impl fmt::Display) -> Self {
        Self::Persistence(message.to_string())
    }

    /// Create a transport error.
    pub fn transport(message: impl fmt::Display) -> Self {
        Self::Transport(message.to_string())
    }
}

/// Outcome of a failed source fetch. Never fatal to the poll loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network, DNS, TLS or timeout failure
    #[error("source unreachable: {0}")]
    Unreachable(String),

    /// The source answered with a non-2xx status
    #[error("source returned HTTP {0}")]
    HttpStatus(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::HttpStatus(status.as_u16()),
            None => Self::Unreachable(e.to_string()),
        }
    }
}
