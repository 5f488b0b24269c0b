//! Durable set of already processed candidate ids.
//!
//! ## File format
//!
//! ```text
//! [
//!   "binance:3f5c0e8a9d41b7c2a06e5f7d18c4b2e9",
//!   "binance:9b1d47e0c5a3f8e21d6b0c7a4e9f3d52"
//! ]
//! ```
//!
//! A UTF-8 JSON array in insertion order. The whole set is rewritten on every
//! persist (temp file, then rename).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::IdNormalization;
use crate::utils::normalize_whitespace;

/// Derive the seen id of a candidate text within a source namespace.
///
/// Pure: the same inputs always give the same id. Ids are truncated SHA-256
/// digests, so a collision silently suppresses an alert.
pub fn seen_id(tag: &str, text: &str, normalization: IdNormalization) -> String {
    let text = match normalization {
        IdNormalization::Strict => text.to_string(),
        IdNormalization::Folded => normalize_whitespace(text).to_lowercase(),
    };

    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    hasher.update([0x1f]);
    hasher.update(text.as_bytes());
    format!("{}:{}", tag, hex::encode(&hasher.finalize()[..16]))
}

/// In-memory seen set backed by a JSON file.
///
/// The in-memory set is authoritative between persists.
#[derive(Debug, Clone)]
pub struct SeenStore {
    path: PathBuf,
    normalization: IdNormalization,
    ids: HashSet<String>,
    order: Vec<String>,
}

impl SeenStore {
    /// An empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>, normalization: IdNormalization) -> Self {
        Self {
            path: path.into(),
            normalization,
            ids: HashSet::new(),
            order: Vec::new(),
        }
    }

    /// Load the store. A missing file is a first run; a malformed file is fatal.
    pub async fn load(path: impl Into<PathBuf>, normalization: IdNormalization) -> Result<Self> {
        let mut store = Self::new(path, normalization);

        let bytes = match tokio::fs::read(&store.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "No seen-store at {}, starting empty",
                    store.path.display()
                );
                return Ok(store);
            }
            Err(e) => {
                return Err(AppError::config(format!(
                    "cannot read seen-store {}: {e}",
                    store.path.display()
                )));
            }
        };

        let ids: Vec<String> = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::config(format!(
                "seen-store {} is malformed ({e}); delete or restore it",
                store.path.display()
            ))
        })?;
        for id in ids {
            store.mark_seen(id);
        }

        log::info!(
            "Loaded {} seen id(s) from {}",
            store.len(),
            store.path.display()
        );
        Ok(store)
    }

    /// Id of `text` in the `tag` namespace, using this store's normalization.
    pub fn id_for(&self, tag: &str, text: &str) -> String {
        seen_id(tag, text, self.normalization)
    }

    pub fn is_new(&self, id: &str) -> bool {
        !self.ids.contains(id)
    }

    /// Record an id. Returns `false` if it was already present.
    pub fn mark_seen(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.insert(id.clone());
        self.order.push(id);
        true
    }

    /// Write the full set to disk, replacing the previous contents.
    ///
    /// A failed write leaves no temporary file behind.
    pub async fn persist(&self) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        if let Err(e) = self.write(&tmp).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::persistence(format!(
                "could not write seen-store {}: {e}",
                self.path.display()
            )));
        }
        log::debug!(
            "Persisted {} seen id(s) to {}",
            self.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn write(&self, tmp: &Path) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(&self.order)?;
        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(tmp, &self.path).await?;
        Ok(())
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
