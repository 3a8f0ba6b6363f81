//! The persisted fallback dataset and its background regeneration.

use crate::fallback::{FallbackDataset, FallbackGenerator, seed_dataset};
use crate::store::{KeyValueStore, keys};
use eyre::Context;
use jiff::{SignedDuration, Timestamp};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

/// Age after which the persisted dataset is regenerated.
pub const MAX_AGE: SignedDuration = SignedDuration::from_secs(24 * 60 * 60);

/// Access to the persisted fallback dataset.
///
/// Reads never wait for generation: when the dataset is missing or old, a regeneration is
/// started in the background and whatever is at hand (the old dataset, or the seed data) is
/// returned right away.
#[derive(Debug)]
pub struct FallbackData {
    store: Arc<dyn KeyValueStore>,
    generator: Arc<Mutex<FallbackGenerator<StdRng>>>,
    /// The regeneration currently running on the tokio runtime, if any.
    refresh: Mutex<Option<JoinHandle<()>>>,
}

impl FallbackData {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    /// Uses `rng` for every dataset this instance generates.
    pub fn with_rng(store: Arc<dyn KeyValueStore>, rng: StdRng) -> Self {
        Self {
            store,
            generator: Arc::new(Mutex::new(FallbackGenerator::new(rng))),
            refresh: Mutex::new(None),
        }
    }

    /// The current fallback dataset. Never fails and never blocks on generation.
    pub fn get_cached(&self) -> FallbackDataset {
        self.get_cached_at(Timestamp::now())
    }

    fn get_cached_at(&self, now: Timestamp) -> FallbackDataset {
        match self.load() {
            Some(dataset) => {
                let fresh = self
                    .last_updated()
                    .is_some_and(|updated| now < updated + MAX_AGE);
                if !fresh {
                    tracing::debug!("fallback data is stale, scheduling regeneration");
                    self.schedule_refresh();
                }
                dataset
            }
            None => {
                tracing::debug!("no fallback data persisted yet, serving seed data");
                self.schedule_refresh();
                seed_dataset(now)
            }
        }
    }

    /// Generates and persists a new dataset right away.
    pub fn refresh(&self) -> eyre::Result<FallbackDataset> {
        regenerate(self.store.as_ref(), &self.generator, Timestamp::now())
    }

    /// Waits for a background regeneration started by [`Self::get_cached`], if one is running.
    pub async fn wait_for_refresh(&self) {
        let handle = self
            .refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::warn!("fallback data regeneration task failed: {}", e);
        }
    }

    fn load(&self) -> Option<FallbackDataset> {
        let json = match self.store.get(keys::MOCK_DATA) {
            Ok(json) => json?,
            Err(e) => {
                tracing::warn!("failed to read fallback data: {:#}", e);
                return None;
            }
        };
        serde_json::from_str(&json)
            .inspect_err(|e| tracing::warn!("discarding unreadable fallback data: {}", e))
            .ok()
    }

    fn last_updated(&self) -> Option<Timestamp> {
        match self.store.get(keys::MOCK_DATA_UPDATED) {
            Ok(value) => value?.parse().ok(),
            Err(e) => {
                tracing::warn!("failed to read fallback data timestamp: {:#}", e);
                None
            }
        }
    }

    /// Starts a regeneration unless one is already running.
    ///
    /// Runs on the blocking pool when called from within a tokio runtime, and inline otherwise.
    fn schedule_refresh(&self) {
        let mut in_flight = self.refresh.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = in_flight.as_ref()
            && !handle.is_finished()
        {
            tracing::trace!("fallback data regeneration already in flight");
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let store = Arc::clone(&self.store);
                let generator = Arc::clone(&self.generator);
                *in_flight = Some(runtime.spawn_blocking(move || {
                    if let Err(e) = regenerate(store.as_ref(), &generator, Timestamp::now()) {
                        tracing::warn!("background fallback data regeneration failed: {:#}", e);
                    }
                }));
            }
            Err(_) => {
                drop(in_flight);
                if let Err(e) = self.refresh() {
                    tracing::warn!("fallback data regeneration failed: {:#}", e);
                }
            }
        }
    }
}

fn regenerate(
    store: &dyn KeyValueStore,
    generator: &Mutex<FallbackGenerator<StdRng>>,
    now: Timestamp,
) -> eyre::Result<FallbackDataset> {
    let dataset = generator
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .generate(now);

    let json = serde_json::to_string(&dataset).context("serialize fallback data")?;
    store
        .set(keys::MOCK_DATA, &json)
        .context("persist fallback data")?;
    store
        .set(keys::MOCK_DATA_UPDATED, &now.to_string())
        .context("persist fallback data timestamp")?;

    tracing::info!(
        trending = dataset.trending_videos.len(),
        search = dataset.search_results.len(),
        "regenerated fallback data"
    );
    Ok(dataset)
}
