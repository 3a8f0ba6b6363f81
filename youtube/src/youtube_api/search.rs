//! YouTube Search API types.
//!
//! Search results only carry snippets, without statistics, so every search is followed by a
//! `videos.list` lookup of the returned ids.

use crate::youtube_api::types::PageInfo;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Parameters for a `search.list` call restricted to videos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text query. `None` lists everything matching the other filters.
    pub q: Option<String>,
    /// Restrict results to a single channel.
    pub channel_id: Option<String>,
    /// `relevance`, `date`, `viewCount`, `rating` or `title`.
    pub order: String,
    pub max_results: u32,
    pub page_token: Option<String>,
    pub published_after: Option<Timestamp>,
}

/// Response structure for the `search.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// See: <https://developers.google.com/youtube/v3/docs/search#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: ResourceId,
}

/// Identifies the resource a search result points at.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceId {
    /// `youtube#video`, `youtube#channel` or `youtube#playlist`.
    pub kind: String,
    /// Only set when `kind` is `youtube#video`.
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

impl SearchListResponse {
    /// The video ids in result order.
    pub fn video_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| item.id.video_id.clone())
            .collect()
    }
}
