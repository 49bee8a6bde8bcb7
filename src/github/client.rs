//! HTTP client for the GitHub commit search endpoint.

use super::{SearchApi, SearchCount, SearchError, ThrottleKind};
use crate::config::GitHubConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use std::cell::Cell;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Backoff used for a secondary limit that did not say how long to wait.
const DEFAULT_SECONDARY_BACKOFF: Duration = Duration::from_secs(60);

/// Slack added on top of the primary reset time to absorb clock skew.
const RESET_SLACK: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    incomplete_results: bool,
}

/// Spaces requests so a per-minute budget is never exceeded.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Cell<Option<Instant>>,
}

impl Pacer {
    /// A pacer for `rpm` requests per minute; 0 disables pacing.
    pub fn per_minute(rpm: u32) -> Self {
        let interval = if rpm == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(60) / rpm
        };

        Self {
            interval,
            last: Cell::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next request may go out, then mark it as sent.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }

        if let Some(last) = self.last.get() {
            let ready_at = last + self.interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }

        self.last.set(Some(Instant::now()));
    }
}

/// Client for `GET /search/commits`.
pub struct GitHubSearch {
    http: reqwest::Client,
    api_url: String,
    token: String,
    pacer: Pacer,
}

impl GitHubSearch {
    /// Create a client authenticated with `token`.
    pub fn new(config: &GitHubConfig, token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        let pacer = Pacer::per_minute(config.requests_per_minute);
        if pacer.interval().is_zero() {
            debug!("Request pacing disabled");
        } else {
            debug!("Spacing requests {:.1}s apart", pacer.interval().as_secs_f64());
        }

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            pacer,
        })
    }

    async fn send(&self, query: &str) -> Result<SearchCount, SearchError> {
        self.pacer.wait().await;

        let url = format!("{}/search/commits", self.api_url);
        debug!("GET {} q={}", url, query);

        let response = self
            .http
            .get(&url)
            .query(&[("q", query), ("per_page", "1")])
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header(USER_AGENT, concat!("agentcommits/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: SearchResponse = response.json().await?;
            if body.incomplete_results {
                warn!("Incomplete results for query: {}", query);
            }
            return Ok(SearchCount {
                total_count: body.total_count,
                incomplete_results: body.incomplete_results,
            });
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();

        if let Some(throttle) = classify_throttle(status, &headers, &body, Utc::now()) {
            return Err(throttle);
        }

        Err(SearchError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

impl SearchApi for GitHubSearch {
    async fn count(&self, query: &str) -> Result<SearchCount, SearchError> {
        self.send(query).await
    }
}

/// Decide whether a failed response is a rate limit, and for how long to back off.
///
/// GitHub answers both limits with 403 or 429. A `retry-after` header always
/// wins; an exhausted quota (`x-ratelimit-remaining: 0`) waits until
/// `x-ratelimit-reset`; otherwise a "secondary rate limit" message or a bare
/// 429 waits a minute.
pub fn classify_throttle(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    now: DateTime<Utc>,
) -> Option<SearchError> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let is_secondary = body.to_lowercase().contains("secondary rate limit");

    if let Some(secs) = header_u64(headers, "retry-after") {
        let kind = if header_str(headers, "x-ratelimit-remaining") == Some("0") && !is_secondary {
            ThrottleKind::Primary
        } else {
            ThrottleKind::Secondary
        };
        return Some(SearchError::Throttled {
            kind,
            retry_after: Duration::from_secs(secs),
        });
    }

    if header_str(headers, "x-ratelimit-remaining") == Some("0") {
        let wait = header_u64(headers, "x-ratelimit-reset")
            .map(|reset| reset.saturating_sub(now.timestamp().max(0) as u64))
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SECONDARY_BACKOFF);
        return Some(SearchError::Throttled {
            kind: ThrottleKind::Primary,
            retry_after: wait + RESET_SLACK,
        });
    }

    if is_secondary || status == StatusCode::TOO_MANY_REQUESTS {
        return Some(SearchError::Throttled {
            kind: ThrottleKind::Secondary,
            retry_after: DEFAULT_SECONDARY_BACKOFF,
        });
    }

    None
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_str(headers, name).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_primary_limit_waits_until_reset() {
        let h = headers(&[
            ("x-ratelimit-remaining", "0"),
            ("x-ratelimit-reset", "1700000042"),
        ]);
        match classify_throttle(StatusCode::FORBIDDEN, &h, "API rate limit exceeded", now()) {
            Some(SearchError::Throttled { kind, retry_after }) => {
                assert_eq!(kind, ThrottleKind::Primary);
                assert_eq!(retry_after, Duration::from_secs(43));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_secondary_limit_uses_retry_after() {
        let h = headers(&[("retry-after", "17")]);
        let body = r#"{"message":"You have exceeded a secondary rate limit."}"#;
        match classify_throttle(StatusCode::FORBIDDEN, &h, body, now()) {
            Some(SearchError::Throttled { kind, retry_after }) => {
                assert_eq!(kind, ThrottleKind::Secondary);
                assert_eq!(retry_after, Duration::from_secs(17));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_secondary_limit_without_header_waits_a_minute() {
        let body = "You have exceeded a Secondary Rate Limit";
        match classify_throttle(StatusCode::FORBIDDEN, &HeaderMap::new(), body, now()) {
            Some(SearchError::Throttled { kind, retry_after }) => {
                assert_eq!(kind, ThrottleKind::Secondary);
                assert_eq!(retry_after, DEFAULT_SECONDARY_BACKOFF);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_plain_forbidden_is_not_a_throttle() {
        let h = headers(&[("x-ratelimit-remaining", "29")]);
        assert!(classify_throttle(StatusCode::FORBIDDEN, &h, "Bad credentials", now()).is_none());
        assert!(classify_throttle(StatusCode::UNPROCESSABLE_ENTITY, &h, "", now()).is_none());
    }

    #[test]
    fn test_too_many_requests_is_secondary() {
        assert!(matches!(
            classify_throttle(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), "", now()),
            Some(SearchError::Throttled {
                kind: ThrottleKind::Secondary,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_search_response() {
        let body = r#"{"total_count": 48213, "incomplete_results": true, "items": [{"sha": "abc"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.total_count, 48213);
        assert!(parsed.incomplete_results);

        let parsed: SearchResponse = serde_json::from_str(r#"{"total_count": 0}"#).unwrap();
        assert!(!parsed.incomplete_results);
    }

    #[test]
    fn test_pacer_interval() {
        assert_eq!(Pacer::per_minute(30).interval(), Duration::from_secs(2));
        assert!(Pacer::per_minute(0).interval().is_zero());
    }

    #[tokio::test]
    async fn test_disabled_pacer_does_not_wait() {
        let pacer = Pacer::per_minute(0);
        let started = std::time::Instant::now();
        for _ in 0..5 {
            pacer.wait().await;
        }
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
