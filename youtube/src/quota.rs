//! Quota accounting and the rate-limit latch that decides between live and fallback data.
//!
//! All reads and writes of the persisted [`QuotaStatus`] go through a [`QuotaTracker`], which
//! serializes its read-modify-write cycles so that concurrent fetches do not lose each other's
//! usage updates.

use crate::store::{KeyValueStore, keys};
use crate::youtube_api::ApiError;
use http::StatusCode;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default daily quota of a YouTube Data API project.
pub const QUOTA_LIMIT: u64 = 10_000;
/// Cost of a `search.list` call.
pub const SEARCH_COST: u64 = 100;
/// Cost of a `videos.list` or `channels.list` call.
pub const LIST_COST: u64 = 1;
/// Cost of a `commentThreads.list` call.
pub const COMMENTS_COST: u64 = 1;

/// How long the rate-limit latch holds before it clears itself.
pub const RATE_LIMIT_COOLDOWN: SignedDuration = SignedDuration::from_secs(24 * 60 * 60);

/// Provider error reasons that indicate an exhausted quota or a rate limit.
const QUOTA_REASONS: &[&str] = &[
    "dailyLimitExceeded",
    "quotaExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
];

/// Persisted quota and rate-limit state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuotaStatus {
    /// Set once a quota or rate-limit error has been observed.
    pub is_rate_limited: bool,
    /// When the limiting error was observed. Always `Some` while `is_rate_limited` is set.
    pub rate_limit_hit_at: Option<Timestamp>,
    /// `rate_limit_hit_at + 24h`. Informational; the latch is cleared from `rate_limit_hit_at`.
    pub reset_time: Option<Timestamp>,
    /// Units consumed since the last [`QuotaTracker::reset_all`].
    pub quota_used: u64,
    /// Advisory budget for display; not enforced.
    pub quota_limit: u64,
    /// `is_rate_limited || manual override`.
    pub using_mock_data: bool,
}

impl Default for QuotaStatus {
    fn default() -> Self {
        Self {
            is_rate_limited: false,
            rate_limit_hit_at: None,
            reset_time: None,
            quota_used: 0,
            quota_limit: QUOTA_LIMIT,
            using_mock_data: false,
        }
    }
}

impl QuotaStatus {
    fn latch(&mut self, now: Timestamp) {
        self.is_rate_limited = true;
        self.rate_limit_hit_at = Some(now);
        self.reset_time = Some(now + RATE_LIMIT_COOLDOWN);
        self.using_mock_data = true;
    }

    fn clear_rate_limit(&mut self) {
        self.is_rate_limited = false;
        self.rate_limit_hit_at = None;
        self.reset_time = None;
    }
}

/// Decides whether a failed request means the quota is exhausted or the key is rate limited.
pub type FailureClassifier = fn(&eyre::Report) -> bool;

/// The default [`FailureClassifier`].
///
/// Best-effort: YouTube does not guarantee a stable error taxonomy, so this matches on the
/// provider message ("quota", "rate limit"), on HTTP 403, and on known reason tokens. Failures
/// without a provider response (network, decoding) are never quota errors.
pub fn is_quota_error(error: &eyre::Report) -> bool {
    ApiError::find(error)
        .is_some_and(|api| matches_quota(&api.message, api.status, &api.reasons))
}

fn matches_quota(message: &str, status: StatusCode, reasons: &[String]) -> bool {
    let lowercase = message.to_lowercase();
    lowercase.contains("quota")
        || lowercase.contains("rate limit")
        || status == StatusCode::FORBIDDEN
        || QUOTA_REASONS
            .iter()
            .any(|token| message.contains(token) || reasons.iter().any(|r| r == token))
}

/// Single owner of the persisted [`QuotaStatus`] and the manual fallback override.
#[derive(Debug)]
pub struct QuotaTracker {
    store: Arc<dyn KeyValueStore>,
    classifier: FailureClassifier,
    lock: Mutex<()>,
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            classifier: is_quota_error,
            lock: Mutex::new(()),
        }
    }

    /// Replaces the predicate used by [`Self::record_failure`].
    pub fn with_classifier(mut self, classifier: FailureClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current status, clearing the rate-limit latch first if its cooldown has elapsed.
    pub fn status(&self) -> QuotaStatus {
        let _guard = self.lock();
        self.load(Timestamp::now())
    }

    /// Whether requests should be served from fallback data.
    pub fn should_use_fallback(&self) -> bool {
        self.status().using_mock_data
    }

    /// Whether the user forced fallback data.
    pub fn manual_override(&self) -> bool {
        let _guard = self.lock();
        self.read_manual_override()
    }

    /// Forces (or stops forcing) fallback data regardless of quota state.
    pub fn set_manual_override(&self, enabled: bool) -> QuotaStatus {
        let _guard = self.lock();
        let value = if enabled { "true" } else { "false" };
        if let Err(e) = self.store.set(keys::MANUAL_OVERRIDE, value) {
            tracing::warn!("failed to persist fallback override: {:#}", e);
        }
        tracing::info!(enabled, "fallback data override changed");
        self.load(Timestamp::now())
    }

    /// Adds `cost` units to the quota counter.
    pub fn record_usage(&self, cost: u64) -> QuotaStatus {
        let _guard = self.lock();
        let mut status = self.load(Timestamp::now());
        status.quota_used = status.quota_used.saturating_add(cost);
        self.write_status(&status);
        status
    }

    /// Records a failed request that was charged `attempted_cost` units.
    ///
    /// If the failure is classified as a quota or rate-limit error, the rate-limit latch is set
    /// and the returned status has `is_rate_limited`; otherwise the rate-limit fields are left
    /// as they were.
    pub fn record_failure(&self, error: &eyre::Report, attempted_cost: u64) -> QuotaStatus {
        self.record_failure_at(error, attempted_cost, Timestamp::now())
    }

    fn record_failure_at(
        &self,
        error: &eyre::Report,
        attempted_cost: u64,
        now: Timestamp,
    ) -> QuotaStatus {
        let _guard = self.lock();
        let mut status = self.load(now);
        status.quota_used = status.quota_used.saturating_add(attempted_cost);

        if (self.classifier)(error) {
            status.latch(now);
            tracing::warn!(
                reset_time = ?status.reset_time,
                "rate limit or quota exceeded, switching to fallback data: {:#}",
                error
            );
        } else {
            tracing::debug!("request failed without hitting quota: {:#}", error);
        }

        self.write_status(&status);
        status
    }

    /// Clears the rate-limit latch, leaving quota usage and the manual override alone.
    pub fn reset_rate_limit(&self) -> QuotaStatus {
        let _guard = self.lock();
        let mut status = self.read_status();
        status.clear_rate_limit();
        status.using_mock_data = self.read_manual_override();
        self.write_status(&status);
        status
    }

    /// Returns everything to defaults, with fallback data forced on.
    ///
    /// Fallback-first is the starting point because no working API key can be assumed.
    pub fn reset_all(&self) -> QuotaStatus {
        let _guard = self.lock();
        if let Err(e) = self.store.set(keys::MANUAL_OVERRIDE, "true") {
            tracing::warn!("failed to persist fallback override: {:#}", e);
        }
        let status = QuotaStatus {
            using_mock_data: true,
            ..QuotaStatus::default()
        };
        self.write_status(&status);
        status
    }

    /// Loads the status, applies auto-recovery and recomputes `using_mock_data`.
    ///
    /// Must be called with the lock held.
    fn load(&self, now: Timestamp) -> QuotaStatus {
        let mut status = self.read_status();
        let mut dirty = false;

        if status.is_rate_limited {
            match status.rate_limit_hit_at {
                Some(hit_at) if now > hit_at + RATE_LIMIT_COOLDOWN => {
                    tracing::info!(%hit_at, "rate limit cooldown elapsed, resuming live requests");
                    status.clear_rate_limit();
                    dirty = true;
                }
                Some(_) => {}
                None => {
                    tracing::warn!("rate limit set without a timestamp, restarting cooldown");
                    status.latch(now);
                    dirty = true;
                }
            }
        }

        let using_mock_data = status.is_rate_limited || self.read_manual_override();
        if status.using_mock_data != using_mock_data {
            status.using_mock_data = using_mock_data;
            dirty = true;
        }

        if dirty {
            self.write_status(&status);
        }
        status
    }

    fn read_status(&self) -> QuotaStatus {
        match self.store.get(keys::API_STATUS) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("discarding unreadable quota status: {}", e);
                QuotaStatus::default()
            }),
            Ok(None) => QuotaStatus::default(),
            Err(e) => {
                tracing::warn!("failed to read quota status: {:#}", e);
                QuotaStatus::default()
            }
        }
    }

    fn read_manual_override(&self) -> bool {
        match self.store.get(keys::MANUAL_OVERRIDE) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                tracing::warn!("failed to read fallback override: {:#}", e);
                false
            }
        }
    }

    fn write_status(&self, status: &QuotaStatus) {
        let json = match serde_json::to_string(status) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("failed to serialize quota status: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(keys::API_STATUS, &json) {
            tracing::warn!("failed to persist quota status: {:#}", e);
        }
    }
}
