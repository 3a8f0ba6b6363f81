//! Synthetic data served while the live API is unavailable or switched off.
//!
//! [`FallbackGenerator`] builds a [`FallbackDataset`] from a random source, [`FallbackData`]
//! keeps one persisted and refreshes it once it is older than a day, and [`seed_dataset`] is the
//! fixed data handed out before anything has been generated.

mod cache;
mod generator;
mod seed;

pub use cache::{FallbackData, MAX_AGE};
pub use generator::FallbackGenerator;
pub use seed::seed_dataset;

use crate::models::{Channel, Comment, Video};
use serde::{Deserialize, Serialize};

/// How many records a fallback search returns when nothing matches the query.
const UNMATCHED_SEARCH_COUNT: usize = 5;

/// Every collection the fallback path can serve, in its persisted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackDataset {
    pub trending_videos: Vec<Video>,
    pub search_results: Vec<Video>,
    pub video_details: Video,
    pub channel_details: Channel,
    pub comments: Vec<Comment>,
    pub channel_videos: Vec<Video>,
}

impl FallbackDataset {
    /// Search results whose title or description contains `query`, ignoring case.
    ///
    /// Falls back to the first few search results so that a search never comes back empty.
    pub fn search(&self, query: &str) -> Vec<Video> {
        let needle = query.to_lowercase();
        let matches: Vec<Video> = self
            .search_results
            .iter()
            .filter(|v| {
                v.title.to_lowercase().contains(&needle)
                    || v.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        if matches.is_empty() {
            self.search_results
                .iter()
                .take(UNMATCHED_SEARCH_COUNT)
                .cloned()
                .collect()
        } else {
            matches
        }
    }

    /// The detail record, relabelled with `video_id` when one is given.
    pub fn video_details_for(&self, video_id: &str) -> Video {
        let mut video = self.video_details.clone();
        if !video_id.is_empty() {
            video.id = video_id.to_string();
        }
        video
    }

    /// The channel record, relabelled with `channel_id` when one is given.
    pub fn channel_details_for(&self, channel_id: &str) -> Channel {
        let mut channel = self.channel_details.clone();
        if !channel_id.is_empty() {
            channel.id = channel_id.to_string();
        }
        channel
    }
}
