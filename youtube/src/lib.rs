//! Data layer of a YouTube browsing front end.
//!
//! [`service::VideoService`] answers every page's data needs (trending, search, video and
//! channel details, comments, channel uploads) from the YouTube Data API, and switches to
//! locally generated fallback data when the API quota runs out or the user asks for it.

pub mod auth_utils;
pub mod config;
pub mod fallback;
pub mod format;
pub mod models;
pub mod quota;
pub mod service;
pub mod store;
pub mod youtube_api;

pub use config::Config;
pub use models::{Channel, Comment, Lookup, Page, Video};
pub use quota::{QuotaStatus, QuotaTracker};
pub use service::{SearchOptions, VideoService, VideoSource};

use crate::store::{KeyValueStore, keys};
use crate::youtube_api::YouTubeClient;
use std::sync::Arc;

/// The API key to use: the one saved in `store`, else the configured one.
pub fn resolve_api_key(config: &Config, store: &dyn KeyValueStore) -> Option<String> {
    let saved = store
        .get(keys::API_KEY)
        .inspect_err(|e| tracing::warn!("failed to read saved API key: {:#}", e))
        .ok()
        .flatten()
        .filter(|key| !key.trim().is_empty());
    saved.or_else(|| config.api_key.clone())
}

/// Builds a live-backed service from `config`, persisting state in `store`.
///
/// Without an API key every live call fails, so fallback data is forced on until a key is set.
pub fn setup_service(config: &Config, store: Arc<dyn KeyValueStore>) -> VideoService<YouTubeClient> {
    let api_key = resolve_api_key(config, store.as_ref());
    let client = YouTubeClient::new(api_key.clone().unwrap_or_default(), reqwest::Client::new())
        .with_base_url(&config.base_url);

    let service = VideoService::new(client, store)
        .with_region_code(&config.region_code)
        .with_max_results(config.max_results);

    if api_key.is_none() && !service.tracker().manual_override() {
        tracing::warn!("no YouTube API key configured, serving fallback data");
        service.tracker().set_manual_override(true);
    }
    service
}
