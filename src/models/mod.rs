// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod candidate;
mod config;
mod document;

// Re-export all public types
pub use candidate::{Alert, Candidate, ClassifiedCandidate, StrategyKind, Tier};
pub use config::{
    ClassifierConfig, Config, ExtractionMode, ExtractorConfig, HttpConfig, IdNormalization,
    NotifierConfig, PersistPolicy, RelevanceGate, SourceConfig, StoreConfig, WatcherConfig,
};
pub use document::{Document, RawDocument};
