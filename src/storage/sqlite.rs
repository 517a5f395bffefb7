//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ResultStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageRecord, ResultStore, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// SQLite result store
///
/// Opening a database clears rows from any earlier crawl: the frontier is not
/// durable, so stale rows would only make the skip-check drop live work.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and clears previous records
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Self::prepare(conn)
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> StorageResult<Self> {
        initialize_schema(&conn)?;
        let cleared = conn.execute("DELETE FROM pages", [])?;
        if cleared > 0 {
            tracing::info!("Cleared {} records from a previous crawl", cleared);
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultStore for SqliteStore {
    fn add(&self, url: &str, links: Option<Vec<String>>) -> StorageResult<()> {
        let links = links.map(|l| serde_json::to_string(&l)).transpose()?;
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT INTO pages (url, links, recorded_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET links = excluded.links, recorded_at = excluded.recorded_at",
            params![url, links, now],
        )?;
        Ok(())
    }

    fn contains(&self, url: &str) -> StorageResult<bool> {
        let found = self
            .conn()
            .query_row("SELECT 1 FROM pages WHERE url = ?1", params![url], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn get(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let links: Option<Option<String>> = self
            .conn()
            .query_row(
                "SELECT links FROM pages WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        match links {
            None => Ok(None),
            Some(links) => Ok(Some(PageRecord {
                url: url.to_string(),
                links: links
                    .map(|json| serde_json::from_str::<Vec<String>>(&json))
                    .transpose()?,
            })),
        }
    }

    fn all_keys(&self) -> StorageResult<BTreeSet<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT url FROM pages")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(keys)
    }

    fn len(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn flush(&self) -> StorageResult<()> {
        // Rows are written as they are recorded; flushing folds the WAL back
        // into the main database file.
        self.conn()
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        tracing::info!("Flushed {} records to SQLite", self.len()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .add(
                "https://example.com/",
                Some(vec!["https://example.com/a".to_string()]),
            )
            .unwrap();

        let record = store.get("https://example.com/").unwrap().unwrap();
        assert_eq!(record.links, Some(vec!["https://example.com/a".to_string()]));
        assert!(store.contains("https://example.com/").unwrap());
    }

    #[test]
    fn test_null_links_round_trip() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.add("https://example.com/missing", None).unwrap();

        let record = store.get("https://example.com/missing").unwrap().unwrap();
        assert_eq!(record.links, None);
    }

    #[test]
    fn test_unknown_url() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(!store.contains("https://example.com/").unwrap());
        assert!(store.get("https://example.com/").unwrap().is_none());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_upsert_last_writer_wins() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.add("https://example.com/", None).unwrap();
        store
            .add("https://example.com/", Some(vec![]))
            .unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(
            store.get("https://example.com/").unwrap().unwrap().links,
            Some(vec![])
        );
    }

    #[test]
    fn test_reopen_clears_previous_crawl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.add("https://example.com/", None).unwrap();
            store.flush().unwrap();
            assert_eq!(store.all_keys().unwrap().len(), 1);
        }

        let store = SqliteStore::new(&path).unwrap();
        assert!(store.is_empty().unwrap());
    }
}
