//! Bounded retry with exponential backoff for outbound HTTP calls.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use tracing::warn;

use crate::error::{StacError, StacResult};

/// How many times, and how patiently, a failed request is repeated.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry (doubles each retry)
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        std::cmp::min(self.initial_delay.saturating_mul(factor), self.max_delay)
    }
}

/// Send the request produced by `build` until it succeeds or the policy is
/// exhausted.
///
/// Non-retryable responses (4xx other than 429) are returned as errors
/// immediately. `context` names the call in errors and logs.
pub async fn send_with_retry<F>(
    policy: &RetryPolicy,
    context: &str,
    mut build: F,
) -> StacResult<Response>
where
    F: FnMut() -> RequestBuilder,
{
    let mut retry = 0;
    loop {
        let err = match build().send().await {
            Ok(resp) if resp.status().is_success() => return Ok(resp),
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                StacError::Status {
                    context: context.to_string(),
                    status,
                    body: body.chars().take(500).collect(),
                }
            }
            Err(e) => StacError::transport(context, e),
        };

        if !err.is_retryable() || retry >= policy.max_retries {
            return Err(err);
        }

        retry += 1;
        let delay = policy.delay_for(retry);
        warn!(
            error = %err,
            retry = retry,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            "{} failed, retrying",
            context
        );
        tokio::time::sleep(delay).await;
    }
}
