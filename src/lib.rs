// src/lib.rs

//! Listing Watcher Library
//!
//! Polls announcement pages and feeds, keeps keyword matches that have not
//! been seen before, and pushes them to a chat.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, FetchError, Result};
pub use pipeline::{RunMode, Watcher};
