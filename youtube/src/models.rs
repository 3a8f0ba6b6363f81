//! The uniform record shapes handed to callers, independent of whether they came from the live
//! API or from fallback data.
//!
//! Counts are kept as decimal strings since that is how YouTube reports them and how they are
//! persisted.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub channel_id: String,
    pub published_at: Timestamp,
    pub thumbnail_url: String,
    pub view_count: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub subscriber_count: String,
    pub video_count: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author_name: String,
    pub author_profile_image_url: String,
    pub text: String,
    pub like_count: String,
    pub published_at: Timestamp,
}

/// One page of a list operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token for the next page, if there is one.
    pub next_page_token: Option<String>,
    /// Whether `items` came from fallback data rather than the live API.
    pub using_mock: bool,
}

impl<T> Page<T> {
    pub(crate) fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_page_token: None,
            using_mock: false,
        }
    }
}

/// The result of a single-item lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup<T> {
    /// `None` when the item does not exist or the live lookup failed.
    pub item: Option<T>,
    pub using_mock: bool,
}
