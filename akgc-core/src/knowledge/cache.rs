//! Persistent fact cache: entity -> ordered facts.
//!
//! The in-memory map is the read-through layer; every changed entry is
//! flushed to a JSON document (sorted keys) with an atomic write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::persistence::{load_json_or_default, save_json};

type Entries = BTreeMap<String, Vec<String>>;

#[derive(Debug, Default)]
pub struct FactCache {
    path: Option<PathBuf>,
    entries: RwLock<Entries>,
}

impl FactCache {
    /// A cache that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache document at `path`.
    ///
    /// Missing or malformed documents yield an empty cache; later inserts
    /// overwrite the file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries: Entries = load_json_or_default(&path);
        tracing::debug!(path = %path.display(), entries = entries.len(), "Loaded fact cache");
        Self {
            path: Some(path),
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Exact key match first, then a case-insensitive scan.
    pub fn get(&self, entity: &str) -> Option<Vec<String>> {
        let entries = self.read();
        if let Some(facts) = entries.get(entity) {
            return Some(facts.clone());
        }
        entries
            .iter()
            .find(|(key, _)| key.to_lowercase() == entity.to_lowercase())
            .map(|(_, facts)| facts.clone())
    }

    /// Store facts for an entity and persist when the entry changed.
    ///
    /// Returns `true` when the cache content changed.
    pub fn insert(&self, entity: &str, facts: Vec<String>) -> bool {
        let mut entries = self.write();
        if entries.get(entity) == Some(&facts) {
            return false;
        }
        entries.insert(entity.to_string(), facts);
        if let Some(path) = &self.path
            && let Err(e) = save_json(path, &*entries)
        {
            tracing::warn!(path = %path.display(), error = %e, "Failed to persist fact cache");
        }
        true
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current entries, in key order.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
