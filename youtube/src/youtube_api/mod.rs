//! YouTube Data API v3 client library.
//!
//! This module covers the read-only, API-key authenticated endpoints a video browsing front end
//! needs: trending videos, search, video and channel details, and comment threads.
//!
//! # Quota
//!
//! Every request is charged against the key's daily quota (10 000 units by default). Searches
//! are expensive (100 units), everything else used here costs 1 unit per call. Search results
//! carry no statistics, so a search is always followed by a `videos.list` lookup of the ids it
//! returned.
//!
//! # Errors
//!
//! Non-success responses surface as an [`ApiError`] inside the returned [`eyre::Report`]. Use
//! [`ApiError::find`] to recover the HTTP status and provider reasons.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use youtube_clone_api::youtube_api::YouTubeClient;
//!
//! # async fn example() -> eyre::Result<()> {
//! let client = YouTubeClient::new("my-api-key", reqwest::Client::new());
//! let trending = client.list_most_popular("US", 10, None).await?;
//! for video in trending.items {
//!     println!("{} ({})", video.snippet.title, video.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod channels;
pub mod client;
pub mod comments;
pub mod error;
pub mod search;
pub mod types;
pub mod videos;

pub use client::{ApiKeyCheck, DEFAULT_BASE_URL, YouTubeClient};
pub use error::ApiError;
pub use types::{PageInfo, Thumbnails};

pub use channels::{Channel, ChannelListResponse, ChannelSnippet, ChannelStatistics};
pub use comments::{CommentThread, CommentThreadListResponse};
pub use search::{SearchListResponse, SearchQuery};
pub use videos::{Video, VideoListResponse, VideoSnippet, VideoStatistics};
