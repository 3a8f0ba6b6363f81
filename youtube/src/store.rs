//! Key-value persistence for settings, quota status and cached fallback data.
//!
//! Values are plain strings; structured values (the quota status, the fallback dataset) are
//! stored as JSON documents by their owners.

use eyre::Context;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Well-known keys used by this crate.
pub mod keys {
    /// User-supplied YouTube Data API key. Takes precedence over the configured key.
    pub const API_KEY: &str = "youtube-api-key";
    /// `"true"` when the user forced fallback data regardless of quota state.
    pub const MANUAL_OVERRIDE: &str = "youtube-manually-use-mock-data";
    /// Serialized [`crate::quota::QuotaStatus`].
    pub const API_STATUS: &str = "youtube-api-status";
    /// Serialized [`crate::fallback::FallbackDataset`].
    pub const MOCK_DATA: &str = "youtube-mock-data";
    /// ISO-8601 timestamp of the last fallback dataset generation.
    pub const MOCK_DATA_UPDATED: &str = "youtube-mock-data-updated";
}

/// A string key-value store with no transactional guarantees.
///
/// Callers that need read-modify-write semantics must serialize those sequences themselves.
pub trait KeyValueStore: std::fmt::Debug + Send + Sync {
    fn get(&self, key: &str) -> eyre::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> eyre::Result<()>;
    fn remove(&self, key: &str) -> eyre::Result<()>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> eyre::Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> eyre::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> eyre::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Every write rewrites the whole file through a temporary sibling followed by a rename, so a
/// crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes load-modify-save cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> eyre::Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("parse store file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e).with_context(|| format!("read store file {}", self.path.display())),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> eyre::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(entries).context("serialize store contents")?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("write temporary store file {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace store file {}", self.path.display()))?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> eyre::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(e) if e.downcast_ref::<serde_json::Error>().is_some() => {
                tracing::warn!("overwriting unreadable store file: {:#}", e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        f(&mut entries);
        self.save(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> eyre::Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> eyre::Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> eyre::Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileStore::new(&path);
        assert_eq!(store.get(keys::API_KEY).unwrap(), None);
        store.set(keys::API_KEY, "abc").unwrap();
        store.set(keys::MANUAL_OVERRIDE, "true").unwrap();
        drop(store);

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(keys::API_KEY).unwrap().as_deref(), Some("abc"));
        reopened.remove(keys::API_KEY).unwrap();
        assert_eq!(reopened.get(keys::API_KEY).unwrap(), None);
        assert_eq!(
            reopened.get(keys::MANUAL_OVERRIDE).unwrap().as_deref(),
            Some("true")
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn file_store_reports_corrupt_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        let err = store.get(keys::API_STATUS).unwrap_err();
        assert!(format!("{err:#}").contains("parse store file"), "{err:#}");
    }

    #[test]
    fn file_store_writes_over_corrupt_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        store.set(keys::MANUAL_OVERRIDE, "true").unwrap();
        assert_eq!(
            store.get(keys::MANUAL_OVERRIDE).unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(FileStore::new(&path).get(keys::API_KEY).unwrap(), None);
    }
}
