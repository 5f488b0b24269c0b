//! Service layer for the watcher.
//!
//! This module contains the business logic for:
//! - Source fetching (`Fetch`, `HttpFetcher`)
//! - Candidate extraction (`Extractor` and its strategies)
//! - Keyword classification (`Classifier`)
//! - Message delivery (`Notifier`, `TelegramNotifier`, `Throttle`)

mod classifier;
mod extractor;
mod fetcher;
pub mod format;
mod notifier;
pub mod strategies;
mod telegram;

pub use classifier::{Classification, Classifier};
pub use extractor::Extractor;
pub use fetcher::{Fetch, HttpFetcher};
pub use notifier::{Notifier, Throttle, send_throttled};
pub use telegram::TelegramNotifier;
