//! YouTube CommentThreads API types.

use crate::models;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Response structure for the `commentThreads.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/commentThreads/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentThreadListResponse {
    #[serde(default)]
    pub items: Vec<CommentThread>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A top-level comment and (optionally) its replies.
///
/// See: <https://developers.google.com/youtube/v3/docs/commentThreads#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentThreadSnippet {
    #[serde(rename = "topLevelComment")]
    pub top_level_comment: Comment,
}

/// See: <https://developers.google.com/youtube/v3/docs/comments#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentSnippet {
    #[serde(rename = "authorDisplayName")]
    pub author_display_name: String,
    #[serde(rename = "authorProfileImageUrl", default)]
    pub author_profile_image_url: String,
    /// The comment text as rendered by YouTube (may contain HTML).
    #[serde(rename = "textDisplay")]
    pub text_display: String,
    #[serde(rename = "likeCount", default)]
    pub like_count: u64,
    #[serde(rename = "publishedAt")]
    pub published_at: Timestamp,
}

impl From<CommentThread> for models::Comment {
    fn from(thread: CommentThread) -> Self {
        let snippet = thread.snippet.top_level_comment.snippet;
        Self {
            id: thread.id,
            author_name: snippet.author_display_name,
            author_profile_image_url: snippet.author_profile_image_url,
            text: snippet.text_display,
            like_count: snippet.like_count.to_string(),
            published_at: snippet.published_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_top_level_comment() {
        let response: CommentThreadListResponse = serde_json::from_str(
            r#"{
              "items": [{
                "id": "thread-1",
                "snippet": {
                  "videoId": "v",
                  "topLevelComment": {
                    "id": "comment-1",
                    "snippet": {
                      "authorDisplayName": "@viewer",
                      "authorProfileImageUrl": "https://yt3.ggpht.com/a.jpg",
                      "textDisplay": "first!",
                      "likeCount": 7,
                      "publishedAt": "2025-03-01T12:00:00Z"
                    }
                  }
                }
              }]
            }"#,
        )
        .unwrap();
        let comment: models::Comment = response.items.into_iter().next().unwrap().into();
        assert_eq!(
            comment,
            models::Comment {
                id: "thread-1".to_string(),
                author_name: "@viewer".to_string(),
                author_profile_image_url: "https://yt3.ggpht.com/a.jpg".to_string(),
                text: "first!".to_string(),
                like_count: "7".to_string(),
                published_at: "2025-03-01T12:00:00Z".parse().unwrap(),
            }
        );
    }
}
