//! In-memory result store flushed to a JSON file
//!
//! The output document maps every recorded URL to either
//! `{"links": [...]}` or `null`.

use crate::storage::traits::{PageRecord, ResultStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Serialize, Deserialize)]
struct StoredLinks {
    links: Vec<String>,
}

/// JSON-backed [`ResultStore`]
#[derive(Debug, Default)]
pub struct JsonStore {
    records: RwLock<BTreeMap<String, Option<Vec<String>>>>,
    path: Option<PathBuf>,
}

impl JsonStore {
    /// Creates an empty store that flushes to `path`
    pub fn new(path: &Path) -> Self {
        Self {
            records: RwLock::default(),
            path: Some(path.to_path_buf()),
        }
    }

    /// Creates an empty store whose flush is a no-op
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Serializes the current records in the output format
    pub fn to_json(&self) -> StorageResult<String> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let document: BTreeMap<&str, Option<StoredLinks>> = records
            .iter()
            .map(|(url, links)| {
                let links = links.as_ref().map(|links| StoredLinks {
                    links: links.clone(),
                });
                (url.as_str(), links)
            })
            .collect();
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

impl ResultStore for JsonStore {
    fn add(&self, url: &str, links: Option<Vec<String>>) -> StorageResult<()> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), links);
        Ok(())
    }

    fn contains(&self, url: &str) -> StorageResult<bool> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(url))
    }

    fn get(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(url).map(|links| PageRecord {
            url: url.to_string(),
            links: links.clone(),
        }))
    }

    fn all_keys(&self) -> StorageResult<BTreeSet<String>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.keys().cloned().collect())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len())
    }

    fn flush(&self) -> StorageResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        tracing::info!("Wrote {} records to {}", self.len()?, path.display());
        Ok(())
    }
}
