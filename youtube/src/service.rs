//! The data-fetch facade: one call per page of the video site, each answered from the live API
//! or from fallback data depending on quota state.
//!
//! Every operation follows the same protocol:
//!
//! 1. If the [`QuotaTracker`] says so, answer from [`FallbackData`] without touching the API.
//! 2. Otherwise make the live call(s) and charge their cost on success.
//! 3. On failure, charge the cost of the failed call. If that failure latched the rate limit,
//!    answer from fallback data; otherwise return an empty result.
//!
//! Operations never return errors. The `using_mock` flag on every result tells callers where the
//! data came from.

use crate::fallback::{FallbackData, FallbackDataset};
use crate::models::{Channel, Comment, Lookup, Page, Video};
use crate::quota::{COMMENTS_COST, LIST_COST, QuotaTracker, SEARCH_COST};
use crate::store::KeyValueStore;
use crate::youtube_api::{
    ChannelListResponse, CommentThreadListResponse, SearchListResponse, SearchQuery,
    VideoListResponse, YouTubeClient,
};
use jiff::Timestamp;
use std::sync::Arc;
use tracing::instrument;

/// Continuation token handed out with fallback pages.
pub const MOCK_NEXT_PAGE_TOKEN: &str = "mock-next-page-token";
pub const DEFAULT_REGION_CODE: &str = "US";
pub const DEFAULT_MAX_RESULTS: u32 = 20;

/// The live endpoints [`VideoService`] depends on.
///
/// Implemented by [`YouTubeClient`]; tests substitute their own.
pub trait VideoSource: Send + Sync {
    fn most_popular(
        &self,
        region_code: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> impl Future<Output = eyre::Result<VideoListResponse>> + Send;

    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = eyre::Result<SearchListResponse>> + Send;

    fn videos_by_id(
        &self,
        video_ids: &[String],
    ) -> impl Future<Output = eyre::Result<VideoListResponse>> + Send;

    fn channels_by_id(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = eyre::Result<ChannelListResponse>> + Send;

    fn comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> impl Future<Output = eyre::Result<CommentThreadListResponse>> + Send;
}

impl VideoSource for YouTubeClient {
    async fn most_popular(
        &self,
        region_code: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> eyre::Result<VideoListResponse> {
        self.list_most_popular(region_code, max_results, page_token)
            .await
    }

    async fn search(&self, query: &SearchQuery) -> eyre::Result<SearchListResponse> {
        self.search_videos(query).await
    }

    async fn videos_by_id(&self, video_ids: &[String]) -> eyre::Result<VideoListResponse> {
        self.list_videos(video_ids).await
    }

    async fn channels_by_id(&self, channel_id: &str) -> eyre::Result<ChannelListResponse> {
        self.list_channels(channel_id).await
    }

    async fn comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> eyre::Result<CommentThreadListResponse> {
        self.list_comment_threads(video_id, max_results, page_token)
            .await
    }
}

/// Optional parameters of [`VideoService::search_videos`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// `relevance` unless set.
    pub order: String,
    pub page_token: Option<String>,
    pub published_after: Option<Timestamp>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            order: "relevance".to_string(),
            page_token: None,
            published_after: None,
        }
    }
}

#[derive(Debug)]
pub struct VideoService<S> {
    source: S,
    tracker: QuotaTracker,
    fallback: FallbackData,
    region_code: String,
    max_results: u32,
}

impl<S: VideoSource> VideoService<S> {
    /// Creates a service whose quota state and fallback data live in `store`.
    pub fn new(source: S, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            source,
            tracker: QuotaTracker::new(Arc::clone(&store)),
            fallback: FallbackData::new(store),
            region_code: DEFAULT_REGION_CODE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_region_code(mut self, region_code: impl Into<String>) -> Self {
        self.region_code = region_code.into();
        self
    }

    /// Page size of list operations.
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_tracker(mut self, tracker: QuotaTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackData) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn tracker(&self) -> &QuotaTracker {
        &self.tracker
    }

    pub fn fallback(&self) -> &FallbackData {
        &self.fallback
    }

    /// Most popular videos in the configured region.
    #[instrument(skip(self))]
    pub async fn trending_videos(&self, page_token: Option<&str>) -> Page<Video> {
        if self.tracker.should_use_fallback() {
            return fallback_page(self.fallback.get_cached().trending_videos);
        }

        match self
            .source
            .most_popular(&self.region_code, self.max_results, page_token)
            .await
        {
            Ok(response) => {
                self.tracker.record_usage(LIST_COST);
                tracing::debug!(videos = response.items.len(), "fetched trending videos");
                Page {
                    items: response.items.into_iter().map(Video::from).collect(),
                    next_page_token: response.next_page_token,
                    using_mock: false,
                }
            }
            Err(e) => self.failed_page(&e, LIST_COST, |data| data.trending_videos),
        }
    }

    /// Videos matching `query`.
    #[instrument(skip(self))]
    pub async fn search_videos(&self, query: &str, options: &SearchOptions) -> Page<Video> {
        if self.tracker.should_use_fallback() {
            return fallback_page(self.fallback.get_cached().search(query));
        }

        let search = SearchQuery {
            q: Some(query.to_string()),
            channel_id: None,
            order: options.order.clone(),
            max_results: self.max_results,
            page_token: options.page_token.clone(),
            published_after: options.published_after,
        };
        self.search_with_details(&search, |data| data.search(query))
            .await
    }

    /// A single video, or `None` if it does not exist.
    #[instrument(skip(self))]
    pub async fn video_details(&self, video_id: &str) -> Lookup<Video> {
        if self.tracker.should_use_fallback() {
            return fallback_lookup(self.fallback.get_cached().video_details_for(video_id));
        }

        match self.source.videos_by_id(&[video_id.to_string()]).await {
            Ok(response) => {
                self.tracker.record_usage(LIST_COST);
                Lookup {
                    item: response.items.into_iter().next().map(Video::from),
                    using_mock: false,
                }
            }
            Err(e) => self.failed_lookup(&e, LIST_COST, |data| data.video_details_for(video_id)),
        }
    }

    /// A single channel, or `None` if it does not exist.
    #[instrument(skip(self))]
    pub async fn channel_details(&self, channel_id: &str) -> Lookup<Channel> {
        if self.tracker.should_use_fallback() {
            return fallback_lookup(self.fallback.get_cached().channel_details_for(channel_id));
        }

        match self.source.channels_by_id(channel_id).await {
            Ok(response) => {
                self.tracker.record_usage(LIST_COST);
                Lookup {
                    item: response.items.into_iter().next().map(Channel::from),
                    using_mock: false,
                }
            }
            Err(e) => {
                self.failed_lookup(&e, LIST_COST, |data| data.channel_details_for(channel_id))
            }
        }
    }

    /// Top-level comments on a video, most relevant first.
    #[instrument(skip(self))]
    pub async fn video_comments(&self, video_id: &str, page_token: Option<&str>) -> Page<Comment> {
        if self.tracker.should_use_fallback() {
            return fallback_page(self.fallback.get_cached().comments);
        }

        match self
            .source
            .comment_threads(video_id, self.max_results, page_token)
            .await
        {
            Ok(response) => {
                self.tracker.record_usage(COMMENTS_COST);
                tracing::debug!(comments = response.items.len(), "fetched comments");
                Page {
                    items: response.items.into_iter().map(Comment::from).collect(),
                    next_page_token: response.next_page_token,
                    using_mock: false,
                }
            }
            Err(e) => self.failed_page(&e, COMMENTS_COST, |data| data.comments),
        }
    }

    /// A channel's uploads, newest first.
    #[instrument(skip(self))]
    pub async fn channel_videos(&self, channel_id: &str, page_token: Option<&str>) -> Page<Video> {
        if self.tracker.should_use_fallback() {
            return fallback_page(self.fallback.get_cached().channel_videos);
        }

        let search = SearchQuery {
            q: None,
            channel_id: Some(channel_id.to_string()),
            order: "date".to_string(),
            max_results: self.max_results,
            page_token: page_token.map(str::to_string),
            published_after: None,
        };
        self.search_with_details(&search, |data| data.channel_videos)
            .await
    }

    /// Runs `search`, then looks up snippet and statistics for the ids it returned.
    async fn search_with_details(
        &self,
        search: &SearchQuery,
        fallback: impl FnOnce(FallbackDataset) -> Vec<Video>,
    ) -> Page<Video> {
        let results = match self.source.search(search).await {
            Ok(results) => {
                self.tracker.record_usage(SEARCH_COST);
                results
            }
            Err(e) => return self.failed_page(&e, SEARCH_COST, fallback),
        };

        let video_ids = results.video_ids();
        if video_ids.is_empty() {
            tracing::debug!("search returned no videos");
            return Page {
                items: Vec::new(),
                next_page_token: results.next_page_token,
                using_mock: false,
            };
        }

        match self.source.videos_by_id(&video_ids).await {
            Ok(details) => {
                self.tracker.record_usage(LIST_COST);
                tracing::debug!(videos = details.items.len(), "fetched search results");
                Page {
                    items: details.items.into_iter().map(Video::from).collect(),
                    next_page_token: results.next_page_token,
                    using_mock: false,
                }
            }
            Err(e) => self.failed_page(&e, LIST_COST, fallback),
        }
    }

    /// Charges a failed call and reports whether fallback data should be served instead.
    fn record_failure(&self, error: &eyre::Report, cost: u64) -> bool {
        let status = self.tracker.record_failure(error, cost);
        if status.is_rate_limited {
            tracing::warn!("falling back to mock data after API error");
        } else {
            tracing::warn!("YouTube API request failed: {:#}", error);
        }
        status.is_rate_limited
    }

    fn failed_page<T>(
        &self,
        error: &eyre::Report,
        cost: u64,
        fallback: impl FnOnce(FallbackDataset) -> Vec<T>,
    ) -> Page<T> {
        if self.record_failure(error, cost) {
            fallback_page(fallback(self.fallback.get_cached()))
        } else {
            Page::empty()
        }
    }

    fn failed_lookup<T>(
        &self,
        error: &eyre::Report,
        cost: u64,
        fallback: impl FnOnce(&FallbackDataset) -> T,
    ) -> Lookup<T> {
        if self.record_failure(error, cost) {
            fallback_lookup(fallback(&self.fallback.get_cached()))
        } else {
            Lookup {
                item: None,
                using_mock: false,
            }
        }
    }
}

fn fallback_page<T>(items: Vec<T>) -> Page<T> {
    Page {
        items,
        next_page_token: Some(MOCK_NEXT_PAGE_TOKEN.to_string()),
        using_mock: true,
    }
}

fn fallback_lookup<T>(item: T) -> Lookup<T> {
    Lookup {
        item: Some(item),
        using_mock: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::youtube_api::ApiError;
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const QUOTA_MESSAGE: &str =
        "The request cannot be completed because you have exceeded your quota.";

    /// Canned responses, with a log of every call made.
    #[derive(Debug, Default)]
    struct FakeSource {
        calls: Mutex<Vec<String>>,
        failures: HashMap<&'static str, (StatusCode, &'static str)>,
        search_ids: Vec<&'static str>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                search_ids: vec!["s1", "s2", "s3"],
                ..Self::default()
            }
        }

        fn failing(mut self, endpoint: &'static str, status: StatusCode, message: &'static str) -> Self {
            self.failures.insert(endpoint, (status, message));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn call(&self, endpoint: &'static str, detail: String) -> eyre::Result<()> {
            self.calls.lock().unwrap().push(format!("{endpoint} {detail}"));
            match self.failures.get(endpoint) {
                Some(&(status, message)) => Err(ApiError::new(status, message).into()),
                None => Ok(()),
            }
        }
    }

    fn video_list(ids: &[String], next_page_token: Option<&str>) -> VideoListResponse {
        let items: Vec<_> = ids
            .iter()
            .map(|id| {
                json!({
                    "id": id,
                    "snippet": {
                        "title": format!("Live video {id}"),
                        "description": "live",
                        "channelId": "UClive",
                        "channelTitle": "Live Channel",
                        "publishedAt": "2025-02-01T09:00:00Z",
                        "thumbnails": { "high": { "url": format!("https://i.ytimg.com/vi/{id}/hq.jpg") } }
                    },
                    "statistics": { "viewCount": "1234" }
                })
            })
            .collect();
        serde_json::from_value(json!({ "items": items, "nextPageToken": next_page_token })).unwrap()
    }

    impl VideoSource for FakeSource {
        async fn most_popular(
            &self,
            region_code: &str,
            max_results: u32,
            page_token: Option<&str>,
        ) -> eyre::Result<VideoListResponse> {
            self.call(
                "mostPopular",
                format!("region={region_code} max={max_results} page={page_token:?}"),
            )?;
            Ok(video_list(&["t1".into(), "t2".into()], Some("trending-next")))
        }

        async fn search(&self, query: &SearchQuery) -> eyre::Result<SearchListResponse> {
            self.call(
                "search",
                format!(
                    "q={:?} channel={:?} order={}",
                    query.q, query.channel_id, query.order
                ),
            )?;
            let items: Vec<_> = self
                .search_ids
                .iter()
                .map(|id| json!({ "id": { "kind": "youtube#video", "videoId": id } }))
                .collect();
            Ok(serde_json::from_value(json!({ "items": items, "nextPageToken": "search-next" }))?)
        }

        async fn videos_by_id(&self, video_ids: &[String]) -> eyre::Result<VideoListResponse> {
            self.call("videos", video_ids.join(","))?;
            Ok(video_list(video_ids, None))
        }

        async fn channels_by_id(&self, channel_id: &str) -> eyre::Result<ChannelListResponse> {
            self.call("channels", channel_id.to_string())?;
            Ok(serde_json::from_value(json!({
                "items": [{
                    "id": channel_id,
                    "snippet": { "title": "Live Channel", "description": "d" },
                    "statistics": { "subscriberCount": "77", "videoCount": "3" }
                }]
            }))?)
        }

        async fn comment_threads(
            &self,
            video_id: &str,
            max_results: u32,
            page_token: Option<&str>,
        ) -> eyre::Result<CommentThreadListResponse> {
            self.call(
                "commentThreads",
                format!("video={video_id} max={max_results} page={page_token:?}"),
            )?;
            Ok(serde_json::from_value(json!({
                "items": [{
                    "id": "thread-1",
                    "snippet": { "topLevelComment": { "id": "c1", "snippet": {
                        "authorDisplayName": "@viewer",
                        "textDisplay": "nice",
                        "likeCount": 3,
                        "publishedAt": "2025-02-02T09:00:00Z"
                    }}}
                }],
                "nextPageToken": "comments-next"
            }))?)
        }
    }

    /// A service with fresh, deterministic fallback data already persisted.
    fn service(source: FakeSource) -> (VideoService<FakeSource>, FallbackDataset) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let fallback = FallbackData::with_rng(Arc::clone(&store), StdRng::seed_from_u64(42));
        let dataset = fallback.refresh().unwrap();
        let service = VideoService::new(source, store).with_fallback(fallback);
        (service, dataset)
    }

    #[tokio::test]
    async fn live_trending_is_mapped_and_charged() {
        let (service, _) = service(FakeSource::new());

        let page = service.trending_videos(Some("p2")).await;
        assert!(!page.using_mock);
        assert_eq!(page.next_page_token.as_deref(), Some("trending-next"));
        let ids: Vec<_> = page.items.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["t1", "t2"]);
        assert_eq!(page.items[0].view_count, "1234");
        assert_eq!(page.items[0].thumbnail_url, "https://i.ytimg.com/vi/t1/hq.jpg");

        assert_eq!(
            service.source().calls(),
            [r#"mostPopular region=US max=20 page=Some("p2")"#]
        );
        assert_eq!(service.tracker().status().quota_used, LIST_COST);
    }

    #[tokio::test]
    async fn configured_region_and_page_size_are_used() {
        let (service, _) = service(FakeSource::new());
        let service = service.with_region_code("SE").with_max_results(5);
        service.trending_videos(None).await;
        assert_eq!(service.source().calls(), ["mostPopular region=SE max=5 page=None"]);
    }

    #[tokio::test]
    async fn quota_error_during_search_serves_fallback() {
        let source = FakeSource::new().failing("search", StatusCode::FORBIDDEN, QUOTA_MESSAGE);
        let (service, dataset) = service(source);

        let page = service
            .search_videos("next.js", &SearchOptions::default())
            .await;
        assert!(page.using_mock);
        assert_eq!(page.next_page_token.as_deref(), Some(MOCK_NEXT_PAGE_TOKEN));
        assert_eq!(page.items, dataset.search("next.js"));

        let status = service.tracker().status();
        assert!(status.is_rate_limited);
        assert!(status.using_mock_data);
        assert_eq!(status.quota_used, SEARCH_COST);
        assert_eq!(service.source().calls().len(), 1);

        // later calls are answered without the API
        let trending = service.trending_videos(None).await;
        assert!(trending.using_mock);
        assert_eq!(trending.items, dataset.trending_videos);
        assert_eq!(service.source().calls().len(), 1);
    }

    #[tokio::test]
    async fn manual_override_skips_live_calls() {
        let (service, dataset) = service(FakeSource::new());
        service.tracker().set_manual_override(true);

        let page = service.trending_videos(None).await;
        assert!(page.using_mock);
        assert_eq!(page.items, dataset.trending_videos);
        assert_eq!(page.next_page_token.as_deref(), Some(MOCK_NEXT_PAGE_TOKEN));

        let video = service.video_details("abc").await;
        assert!(video.using_mock);
        assert_eq!(video.item.unwrap().id, "abc");

        let channel = service.channel_details("UCabc").await;
        assert_eq!(channel.item.unwrap().id, "UCabc");

        assert_eq!(service.video_comments("abc", None).await.items, dataset.comments);
        assert_eq!(
            service.channel_videos("UCabc", None).await.items,
            dataset.channel_videos
        );

        assert!(service.source().calls().is_empty());
        assert_eq!(service.tracker().status().quota_used, 0);
    }

    #[tokio::test]
    async fn not_found_returns_nothing() {
        let source =
            FakeSource::new().failing("channels", StatusCode::NOT_FOUND, "Channel not found.");
        let (service, _) = service(source);

        let lookup = service.channel_details("UCgone").await;
        assert_eq!(lookup, Lookup { item: None, using_mock: false });

        let status = service.tracker().status();
        assert!(!status.is_rate_limited);
        assert_eq!(status.quota_used, LIST_COST);
    }

    #[tokio::test]
    async fn live_search_looks_up_details() {
        let (service, _) = service(FakeSource::new());

        let options = SearchOptions {
            order: "viewCount".to_string(),
            ..SearchOptions::default()
        };
        let page = service.search_videos("rust", &options).await;
        assert!(!page.using_mock);
        assert_eq!(page.next_page_token.as_deref(), Some("search-next"));
        let ids: Vec<_> = page.items.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["s1", "s2", "s3"]);

        assert_eq!(
            service.source().calls(),
            [
                r#"search q=Some("rust") channel=None order=viewCount"#,
                "videos s1,s2,s3",
            ]
        );
        assert_eq!(service.tracker().status().quota_used, SEARCH_COST + LIST_COST);
    }

    #[tokio::test]
    async fn empty_search_skips_detail_lookup() {
        let source = FakeSource {
            search_ids: Vec::new(),
            ..FakeSource::default()
        };
        let (service, _) = service(source);

        let page = service
            .search_videos("nothing here", &SearchOptions::default())
            .await;
        assert!(page.items.is_empty());
        assert!(!page.using_mock);
        assert_eq!(page.next_page_token.as_deref(), Some("search-next"));
        assert_eq!(service.source().calls().len(), 1);
        assert_eq!(service.tracker().status().quota_used, SEARCH_COST);
    }

    #[tokio::test]
    async fn failed_detail_lookup_fails_the_search() {
        let source =
            FakeSource::new().failing("videos", StatusCode::INTERNAL_SERVER_ERROR, "Backend Error");
        let (service, _) = service(source);

        let page = service
            .search_videos("rust", &SearchOptions::default())
            .await;
        assert_eq!(page, Page::empty());

        let status = service.tracker().status();
        assert!(!status.is_rate_limited);
        assert_eq!(status.quota_used, SEARCH_COST + LIST_COST);
    }

    #[tokio::test]
    async fn quota_error_during_detail_lookup_serves_fallback() {
        let source = FakeSource::new().failing("videos", StatusCode::FORBIDDEN, QUOTA_MESSAGE);
        let (service, dataset) = service(source);

        let page = service.channel_videos("UCx", None).await;
        assert!(page.using_mock);
        assert_eq!(page.items, dataset.channel_videos);
        assert_eq!(service.tracker().status().quota_used, SEARCH_COST + LIST_COST);
    }

    #[tokio::test]
    async fn channel_videos_are_newest_first() {
        let (service, _) = service(FakeSource::new());
        let page = service.channel_videos("UCx", Some("p3")).await;
        assert_eq!(page.items.len(), 3);
        assert_eq!(
            service.source().calls()[0],
            r#"search q=None channel=Some("UCx") order=date"#
        );
    }

    #[tokio::test]
    async fn video_details_quota_error_substitutes_id() {
        let source = FakeSource::new().failing("videos", StatusCode::FORBIDDEN, QUOTA_MESSAGE);
        let (service, dataset) = service(source);

        let lookup = service.video_details("dQw4w9WgXcQ").await;
        assert!(lookup.using_mock);
        let video = lookup.item.unwrap();
        assert_eq!(video.id, "dQw4w9WgXcQ");
        assert_eq!(video.title, dataset.video_details.title);
    }

    #[tokio::test]
    async fn live_details_and_comments() {
        let (service, _) = service(FakeSource::new());

        let video = service.video_details("v1").await;
        assert!(!video.using_mock);
        assert_eq!(video.item.unwrap().title, "Live video v1");

        let channel = service.channel_details("UC1").await.item.unwrap();
        assert_eq!(channel.subscriber_count, "77");

        let comments = service.video_comments("v1", None).await;
        assert_eq!(comments.next_page_token.as_deref(), Some("comments-next"));
        assert_eq!(comments.items[0].author_name, "@viewer");
        assert_eq!(comments.items[0].like_count, "3");

        assert_eq!(
            service.tracker().status().quota_used,
            LIST_COST + LIST_COST + COMMENTS_COST
        );
    }

    #[tokio::test]
    async fn bad_request_is_not_a_quota_error() {
        let (service, _) = service(FakeSource::new().failing(
            "commentThreads",
            StatusCode::BAD_REQUEST,
            "Invalid page token.",
        ));
        let page = service.video_comments("v1", Some("garbage")).await;
        assert_eq!(page, Page::empty());
        assert!(!service.tracker().should_use_fallback());
    }
}
