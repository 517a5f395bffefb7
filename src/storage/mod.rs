//! Storage module for crawl results
//!
//! The result store persists what each visited URL linked to and is the sole
//! source of truth for "already visited". Two backends are provided:
//! - [`JsonStore`]: in memory, written out as one JSON document on flush
//! - [`SqliteStore`]: rows written as they are recorded

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::JsonStore;
pub use sqlite::SqliteStore;
pub use traits::{PageRecord, ResultStore, StorageError, StorageResult};

use std::path::Path;
use std::sync::Arc;

/// Opens the result store for `path`
///
/// A `.db`, `.sqlite` or `.sqlite3` extension selects SQLite; anything else
/// is written as JSON.
pub fn open_store(path: &Path) -> StorageResult<Arc<dyn ResultStore>> {
    let is_sqlite = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "db" | "sqlite" | "sqlite3"));

    if is_sqlite {
        tracing::info!("Recording results in SQLite database {}", path.display());
        Ok(Arc::new(SqliteStore::new(path)?))
    } else {
        tracing::info!("Recording results in JSON file {}", path.display());
        Ok(Arc::new(JsonStore::new(path)))
    }
}
