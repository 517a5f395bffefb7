//! Storage traits and error types

use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One recorded URL and what was learned from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub url: String,
    /// Links extracted from the page; `None` for pages recorded without link
    /// data (empty documents, redirect sources, not-found pages)
    pub links: Option<Vec<String>>,
}

/// Key-value record of crawl outcomes
///
/// The store doubles as the crawl's visited set: a URL counts as visited if
/// and only if it is a key here. Implementations must tolerate concurrent
/// callers; writes are per key and the last writer wins.
pub trait ResultStore: Send + Sync {
    /// Records `url`, replacing any earlier record for it
    fn add(&self, url: &str, links: Option<Vec<String>>) -> StorageResult<()>;

    /// Returns true if `url` has been recorded
    fn contains(&self, url: &str) -> StorageResult<bool>;

    /// Returns the record for `url`, if any
    fn get(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Returns every recorded URL
    fn all_keys(&self) -> StorageResult<BTreeSet<String>>;

    /// Number of recorded URLs
    fn len(&self) -> StorageResult<usize>;

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Persists everything recorded so far
    fn flush(&self) -> StorageResult<()>;
}
