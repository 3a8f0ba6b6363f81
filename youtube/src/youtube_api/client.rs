//! Core YouTube API client functionality.

use crate::youtube_api::{
    channels::ChannelListResponse, comments::CommentThreadListResponse, error::ApiError,
    search::SearchListResponse, search::SearchQuery, videos::VideoListResponse,
};
use eyre::Context;
use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::instrument;

/// Base URL of the YouTube Data API v3.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Client for the public, API-key authenticated parts of the YouTube Data API v3.
///
/// Every call is charged against the key's daily quota. The client itself does not track
/// quota; see [`crate::quota::QuotaTracker`] for that.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    api_key: String,
    base_url: String,
    /// HTTP client for API requests
    client: reqwest::Client,
}

/// Outcome of [`YouTubeClient::validate_api_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyCheck {
    pub success: bool,
    pub message: String,
}

impl YouTubeClient {
    /// Creates a new YouTube API client using `api_key` for every request.
    pub fn new(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        }
    }

    /// Points the client at a different API root, such as a local test double.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Makes a GET request to the given API resource with common error handling.
    ///
    /// Appends the API key to `query_params`. Non-success responses are decoded into an
    /// [`ApiError`] that callers can recover from the returned report with [`ApiError::find`].
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    pub(crate) async fn make_request(
        &self,
        resource: &str,
        query_params: &[(&str, &str)],
    ) -> eyre::Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, resource);

        let response = self
            .client
            .get(&url)
            .query(query_params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            // the request URL carries the API key
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("send request to YouTube API: {resource}"))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ApiError::from_body(status_code, &error_text).into());
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query_params: &[(&str, &str)],
    ) -> eyre::Result<T> {
        let response = self.make_request(resource, query_params).await?;
        response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("parse YouTube {resource} API response as JSON"))
    }

    /// Lists the most popular videos in a region.
    ///
    /// # API Cost
    ///
    /// This operation costs 1 quota unit per call.
    ///
    /// See: <https://developers.google.com/youtube/v3/docs/videos/list>
    #[instrument(skip(self))]
    pub async fn list_most_popular(
        &self,
        region_code: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> eyre::Result<VideoListResponse> {
        let max_results_string = max_results.to_string();
        let mut query_params = vec![
            ("part", "snippet,statistics"),
            ("chart", "mostPopular"),
            ("maxResults", max_results_string.as_str()),
            ("regionCode", region_code),
        ];
        if let Some(token) = page_token {
            query_params.push(("pageToken", token));
        }

        let videos: VideoListResponse = self.get_json("videos", &query_params).await?;

        tracing::debug!(
            total_results = videos.page_info.total_results,
            returned_items = videos.items.len(),
            "fetched most popular videos"
        );

        Ok(videos)
    }

    /// Searches for videos.
    ///
    /// # API Cost
    ///
    /// This operation costs 100 quota units per call.
    ///
    /// See: <https://developers.google.com/youtube/v3/docs/search/list>
    #[instrument(skip(self))]
    pub async fn search_videos(&self, query: &SearchQuery) -> eyre::Result<SearchListResponse> {
        let max_results_string = query.max_results.to_string();
        let published_after = query.published_after.map(|t| t.to_string());
        let mut query_params = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("maxResults", max_results_string.as_str()),
            ("order", query.order.as_str()),
        ];
        if let Some(q) = &query.q {
            query_params.push(("q", q.as_str()));
        }
        if let Some(channel_id) = &query.channel_id {
            query_params.push(("channelId", channel_id.as_str()));
        }
        if let Some(token) = &query.page_token {
            query_params.push(("pageToken", token.as_str()));
        }
        if let Some(published_after) = &published_after {
            query_params.push(("publishedAfter", published_after.as_str()));
        }

        let results: SearchListResponse = self.get_json("search", &query_params).await?;

        tracing::debug!(
            total_results = results.page_info.total_results,
            returned_items = results.items.len(),
            "fetched search results"
        );

        Ok(results)
    }

    /// Gets snippet and statistics for a batch of videos by id.
    ///
    /// # API Cost
    ///
    /// This operation costs 1 quota unit per call, regardless of the number of ids.
    ///
    /// See: <https://developers.google.com/youtube/v3/docs/videos/list>
    #[instrument(skip(self))]
    pub async fn list_videos(&self, video_ids: &[String]) -> eyre::Result<VideoListResponse> {
        let ids = video_ids.join(",");
        let query_params = [("part", "snippet,statistics"), ("id", ids.as_str())];

        let videos: VideoListResponse = self.get_json("videos", &query_params).await?;

        tracing::debug!(
            requested = video_ids.len(),
            returned_items = videos.items.len(),
            "fetched videos by id"
        );

        Ok(videos)
    }

    /// Gets snippet and statistics for a channel.
    ///
    /// # API Cost
    ///
    /// This operation costs 1 quota unit per call.
    ///
    /// See: <https://developers.google.com/youtube/v3/docs/channels/list>
    #[instrument(skip(self))]
    pub async fn list_channels(&self, channel_id: &str) -> eyre::Result<ChannelListResponse> {
        let query_params = [("part", "snippet,statistics"), ("id", channel_id)];

        let channels: ChannelListResponse = self.get_json("channels", &query_params).await?;

        tracing::debug!(
            channel_id,
            returned_items = channels.items.len(),
            "fetched channel"
        );

        Ok(channels)
    }

    /// Lists top-level comment threads on a video, most relevant first.
    ///
    /// # API Cost
    ///
    /// This operation costs 1 quota unit per call.
    ///
    /// See: <https://developers.google.com/youtube/v3/docs/commentThreads/list>
    #[instrument(skip(self))]
    pub async fn list_comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> eyre::Result<CommentThreadListResponse> {
        let max_results_string = max_results.to_string();
        let mut query_params = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("maxResults", max_results_string.as_str()),
            ("order", "relevance"),
        ];
        if let Some(token) = page_token {
            query_params.push(("pageToken", token));
        }

        let threads: CommentThreadListResponse =
            self.get_json("commentThreads", &query_params).await?;

        tracing::debug!(
            video_id,
            returned_items = threads.items.len(),
            "fetched comment threads"
        );

        Ok(threads)
    }

    /// Checks that the client's API key is accepted by making a minimal `videos.list` call.
    ///
    /// Never fails; problems are described in the returned message.
    #[instrument(skip(self), ret)]
    pub async fn validate_api_key(&self) -> ApiKeyCheck {
        let result = self
            .make_request(
                "videos",
                &[
                    ("part", "snippet"),
                    ("chart", "mostPopular"),
                    ("maxResults", "1"),
                ],
            )
            .await;

        match result {
            Ok(_) => ApiKeyCheck {
                success: true,
                message: "API key is valid and working correctly.".to_string(),
            },
            Err(e) => {
                tracing::warn!("YouTube API key validation failed: {:#}", e);
                ApiKeyCheck {
                    success: false,
                    message: describe_key_failure(&e),
                }
            }
        }
    }
}

fn describe_key_failure(error: &eyre::Report) -> String {
    match ApiError::find(error) {
        Some(api) if api.status == StatusCode::FORBIDDEN => {
            "API key is invalid or has insufficient permissions.".to_string()
        }
        Some(api) if api.status == StatusCode::BAD_REQUEST => "Invalid API key format.".to_string(),
        Some(api) => api.message.clone(),
        None => {
            "Network error while testing API key. Please check your internet connection."
                .to_string()
        }
    }
}
