//! Decoding of YouTube API error responses.

use http::StatusCode;
use serde::Deserialize;

/// A non-success response from the YouTube Data API.
///
/// Carried inside the [`eyre::Report`] returned by the client so that callers can recover it
/// with [`ApiError::find`] and decide how to react (for example, switching to fallback data when
/// the daily quota is exhausted).
///
/// See: <https://developers.google.com/youtube/v3/docs/errors>
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("YouTube API request failed with status {status}: {message}")]
pub struct ApiError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Human-readable message from the error body, or a generic one if the body had none.
    pub message: String,
    /// Machine-readable reasons (`quotaExceeded`, `keyInvalid`, ...) from `error.errors[].reason`.
    pub reasons: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            reasons: Vec::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }

    /// Builds an error from a raw response body.
    ///
    /// YouTube wraps errors as `{"error": {"code", "message", "errors": [{"reason", ...}]}}`.
    /// Bodies that do not follow that shape keep their text as the message.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope { error }) => Self {
                status,
                message: error
                    .message
                    .unwrap_or_else(|| format!("YouTube API error: {}", status.as_u16())),
                reasons: error.errors.into_iter().filter_map(|e| e.reason).collect(),
            },
            Err(_) if body.trim().is_empty() => {
                Self::new(status, format!("YouTube API error: {}", status.as_u16()))
            }
            Err(_) => Self::new(status, body.trim()),
        }
    }

    /// Finds an [`ApiError`] anywhere in the chain of causes of `report`.
    pub fn find(report: &eyre::Report) -> Option<&ApiError> {
        report.chain().find_map(|e| e.downcast_ref::<ApiError>())
    }
}
