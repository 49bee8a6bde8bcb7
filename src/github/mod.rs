//! GitHub commit search access.
//!
//! The collector only ever needs one thing from the API: the approximate
//! number of commits matching a query. [`SearchApi`] is that seam; the real
//! client lives in [`client`] and the bounded retry wrapper in [`retry`].

pub mod client;
pub mod retry;

pub use client::GitHubSearch;
pub use retry::{with_retry, RetryPolicy};

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which throttle the endpoint signalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleKind {
    /// Request quota for the current window is exhausted.
    Primary,
    /// Abuse detection kicked in.
    Secondary,
}

impl fmt::Display for ThrottleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThrottleKind::Primary => write!(f, "primary"),
            ThrottleKind::Secondary => write!(f, "secondary"),
        }
    }
}

/// Errors from a single count query.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{kind} rate limit hit, retry after {retry_after:?}")]
    Throttled {
        kind: ThrottleKind,
        retry_after: Duration,
    },
    #[error("still rate limited ({kind}) after {retries} retries")]
    RetriesExhausted { kind: ThrottleKind, retries: u32 },
    #[error("GitHub API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The approximate match count returned for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchCount {
    pub total_count: u64,
    /// The API gave up before scanning the whole index.
    pub incomplete_results: bool,
}

#[cfg(test)]
impl SearchCount {
    pub fn exact(total_count: u64) -> Self {
        Self {
            total_count,
            incomplete_results: false,
        }
    }
}

/// Something that can count commits matching a search query.
pub trait SearchApi {
    async fn count(&self, query: &str) -> Result<SearchCount, SearchError>;
}
