//! Bounded retry around throttled requests.

use super::SearchError;
use std::future::Future;
use tracing::warn;

/// Retries allowed per request after the first attempt.
pub const MAX_RETRIES: u32 = 3;

/// How many times a throttled request may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
        }
    }
}

/// A successful result and the number of retries it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub retries: u32,
}

/// Run `op`, sleeping for the endpoint's backoff and retrying on throttles.
///
/// Only [`SearchError::Throttled`] is retried. Once `policy.max_retries`
/// retries have been spent, the next throttle becomes
/// [`SearchError::RetriesExhausted`]. Any other error is returned as is.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<Retried<T>, SearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SearchError>>,
{
    let mut retries = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(Retried { value, retries }),
            Err(SearchError::Throttled { kind, retry_after }) => {
                if retries >= policy.max_retries {
                    return Err(SearchError::RetriesExhausted { kind, retries });
                }
                retries += 1;
                warn!(
                    "{} rate limit on '{}', retry {}/{} in {:.1}s",
                    kind,
                    label,
                    retries,
                    policy.max_retries,
                    retry_after.as_secs_f64()
                );
                tokio::time::sleep(retry_after).await;
            }
            Err(e) => return Err(e),
        }
    }
}
