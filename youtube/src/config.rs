//! Runtime settings.

use crate::service::{DEFAULT_MAX_RESULTS, DEFAULT_REGION_CODE};
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crate::youtube_api::DEFAULT_BASE_URL;
use eyre::Context;
use std::path::PathBuf;
use std::sync::Arc;

pub const API_KEY_VAR: &str = "YOUTUBE_API_KEY";
pub const BASE_URL_VAR: &str = "YOUTUBE_API_BASE_URL";
pub const REGION_CODE_VAR: &str = "YOUTUBE_REGION_CODE";
pub const MAX_RESULTS_VAR: &str = "YOUTUBE_MAX_RESULTS";
pub const STORE_VAR: &str = "YOUTUBE_CLONE_STORE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Used when no key has been saved in the store.
    pub api_key: Option<String>,
    pub base_url: String,
    pub region_code: String,
    /// Page size of list operations.
    pub max_results: u32,
    /// Where settings, quota state and fallback data are persisted. `None` keeps them in memory.
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            region_code: DEFAULT_REGION_CODE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            store_path: default_store_path(),
        }
    }
}

/// `<data dir>/youtube-clone/store.json`, if the platform has a data directory.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("youtube-clone").join("store.json"))
}

impl Config {
    /// Defaults overridden by the `YOUTUBE_*` environment variables.
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(api_key) = var(API_KEY_VAR) {
            config.api_key = Some(api_key);
        }
        if let Some(base_url) = var(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        if let Some(region_code) = var(REGION_CODE_VAR) {
            config.region_code = region_code;
        }
        if let Some(max_results) = var(MAX_RESULTS_VAR) {
            config.max_results = max_results
                .trim()
                .parse()
                .with_context(|| format!("parse {MAX_RESULTS_VAR}={max_results:?}"))?;
        }
        if let Some(store) = var(STORE_VAR) {
            config.store_path = Some(PathBuf::from(store));
        }

        Ok(config)
    }

    /// Opens the configured store.
    pub fn open_store(&self) -> Arc<dyn KeyValueStore> {
        match &self.store_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using file store");
                Arc::new(FileStore::new(path))
            }
            None => {
                tracing::warn!("no data directory available, settings will not be persisted");
                Arc::new(MemoryStore::new())
            }
        }
    }
}
