//! Persistence for the set of already alerted items.
//!
//! ## Directory Structure
//!
//! ```text
//! ./
//! ├── watcher.toml
//! └── seen_posts.json   # JSON array of seen ids, rewritten whole
//! ```

pub mod seen;

pub use seen::{SeenStore, seen_id};
