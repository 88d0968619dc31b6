//! Upstream partner APIs
//!
//! One client per platform, both behind [`LeaderboardSource`]. Clients make a
//! single GET per call and never retry; resilience lives in the cache layer.

pub mod betbolt;
pub mod rainbet;

pub use betbolt::BetboltClient;
pub use rainbet::RainbetClient;

use async_trait::async_trait;
use reqwest::{Client, Request, Url};
use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

use crate::leaderboard::time_window::TimeWindow;
use crate::models::Platform;

pub const DEFAULT_LIMIT: u32 = 100;
pub const DEFAULT_OFFSET: u32 = 0;
pub const DEFAULT_SORT_BY: &str = "wager";
pub const DEFAULT_SORT_ORDER: &str = "desc";

/// Optional tuning forwarded to platforms that support it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub categories: Option<String>,
}

#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Raw upstream payload for `window`.
    async fn fetch(&self, window: &TimeWindow, query: &UpstreamQuery)
        -> Result<Value, UpstreamError>;
}

/// Errors surfaced by upstream fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Upstream answered with a non-2xx status.
    Status { status: u16, body: String },
    /// Request never produced a response (DNS, connect, TLS, timeout).
    Transport(String),
    /// 2xx body was not JSON.
    Decode(String),
    /// Payload decoded but failed data-quality checks.
    Schema(String),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, body } => write!(f, "upstream returned {}: {}", status, body),
            Self::Transport(e) => write!(f, "upstream unreachable: {}", e),
            Self::Decode(e) => write!(f, "upstream body not decodable: {}", e),
            Self::Schema(e) => write!(f, "upstream payload rejected: {}", e),
        }
    }
}

impl std::error::Error for UpstreamError {}

// reqwest renders the request URL in its errors, and the URL may carry a key
impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

/// Query parameters whose values never reach the logs.
const SECRET_PARAMS: &[&str] = &["key", "api_key", "token"];

/// `url` with credential query values replaced by `***`.
pub fn redacted_url(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| SECRET_PARAMS.contains(&k.as_ref())) {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if SECRET_PARAMS.contains(&k.as_ref()) {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// Sends `request`, maps non-2xx to [`UpstreamError::Status`] and decodes the JSON body.
pub(crate) async fn execute_json(
    client: &Client,
    platform: Platform,
    request: Request,
) -> Result<Value, UpstreamError> {
    let url = redacted_url(request.url());
    let response = client.execute(request).await.map_err(|e| {
        let err = UpstreamError::from(e);
        warn!(%platform, url = %url, error = %err, "upstream request failed");
        err
    })?;

    let status = response.status();
    info!(%platform, url = %url, status = %status, "upstream called");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| UpstreamError::Decode(e.without_url().to_string()))?;

    match payload.get(platform.entries_field()).and_then(Value::as_array) {
        Some(entries) => info!(%platform, count = entries.len(), "upstream results received"),
        None => warn!(
            %platform,
            field = platform.entries_field(),
            "upstream payload has no entries list"
        ),
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_url_hides_key() {
        let url = Url::parse("https://example.com/a?start_at=2025-01-01&key=s3cr3t").unwrap();
        let redacted = redacted_url(&url);
        assert!(!redacted.contains("s3cr3t"));
        assert!(redacted.contains("key=***") || redacted.contains("key=%2A%2A%2A"));
        assert!(redacted.contains("start_at=2025-01-01"));
    }

    #[test]
    fn test_redacted_url_untouched_without_secrets() {
        let url = Url::parse("https://example.com/a?limit=10").unwrap();
        assert_eq!(redacted_url(&url), "https://example.com/a?limit=10");
    }

    #[test]
    fn test_error_display() {
        let err = UpstreamError::Status {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.to_string(), "upstream returned 429: slow down");
        assert!(UpstreamError::Transport("dns".into())
            .to_string()
            .contains("unreachable"));
    }
}
