//! HTTP fetcher implementation
//!
//! This module handles every request the harvester makes, including:
//! - Building the shared HTTP client with a fixed request timeout
//! - Rotating the user agent on every attempt
//! - Retrying HTTP 429 responses with a bounded, growing backoff
//! - Classifying failures into the `FetchFailure` taxonomy
//! - Aborting in-flight requests and pending retries on cancellation

use crate::config::FetchConfig;
use crate::crawler::identity::UserAgentPool;
use reqwest::header::{HeaderMap, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a single page or detail fetch did not produce content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("rate limited, retry budget exhausted")]
    RateLimited,

    #[error("not found")]
    NotFound,

    #[error("server error: HTTP {0}")]
    ServerError(u16),

    #[error("network error")]
    Network,

    #[error("cancelled")]
    Cancelled,
}

impl FetchFailure {
    /// Short machine-readable label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::ServerError(_) => "server_error",
            Self::Network => "network",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Retry and backoff parameters for HTTP 429 handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,

    /// Wait used when the response has no usable Retry-After header
    pub default_retry_after: Duration,

    /// Cap applied to the server's hint
    pub max_retry_after: Duration,

    /// Multiplier applied after every further 429
    pub backoff_factor: u32,
}

impl RetryPolicy {
    /// Builds the policy from configuration
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            default_retry_after: Duration::from_secs(config.default_retry_after_secs),
            max_retry_after: Duration::from_secs(config.max_retry_after_secs),
            backoff_factor: config.backoff_factor.max(1),
        }
    }

    /// Computes the wait before retrying after a 429
    ///
    /// The server hint (or the default) is clamped to `max_retry_after` and
    /// then scaled by `backoff_factor ^ retry`, so the first retry waits
    /// exactly the hint and every further one waits longer.
    pub fn delay(&self, hint: Option<Duration>, retry: u32) -> Duration {
        let base = hint
            .unwrap_or(self.default_retry_after)
            .min(self.max_retry_after);
        let multiplier = self.backoff_factor.saturating_pow(retry);
        base.saturating_mul(multiplier)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Builds the shared HTTP client
///
/// The user agent is deliberately left unset here; it is chosen per attempt
/// from the caller's `UserAgentPool`.
///
/// # Arguments
///
/// * `config` - Fetch configuration carrying the request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages and detail documents with retry on rate limiting
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl PageFetcher {
    /// Creates a fetcher around an existing client
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Fetches a URL and returns its body as text
    ///
    /// # Status Handling
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 200 | Return body |
    /// | HTTP 429 | Wait Retry-After (bounded) x backoff, retry up to budget |
    /// | HTTP 429, budget spent | `RateLimited` |
    /// | HTTP 404 | `NotFound`, no retry |
    /// | Any other status | `ServerError(status)`, no retry |
    /// | Timeout | `Timeout`, no retry |
    /// | Connection / other transport error | `Network`, no retry |
    /// | Cancellation | `Cancelled` |
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `identities` - Pool the user agent is drawn from on every attempt
    /// * `cancel` - Aborts the in-flight request or pending retry wait
    pub async fn fetch(
        &self,
        url: &str,
        identities: &UserAgentPool,
        cancel: &CancellationToken,
    ) -> Result<String, FetchFailure> {
        for attempt in 0..=self.policy.max_retries {
            let agent = identities.pick();
            let request = self.client.get(url).header(USER_AGENT, agent).send();

            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(FetchFailure::Cancelled),
                result = request => result.map_err(|e| classify_error(url, &e))?,
            };

            match response.status() {
                StatusCode::OK => {
                    return tokio::select! {
                        _ = cancel.cancelled() => Err(FetchFailure::Cancelled),
                        body = response.text() => body.map_err(|e| classify_error(url, &e)),
                    };
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempt == self.policy.max_retries {
                        break;
                    }

                    let hint = parse_retry_after(response.headers());
                    let delay = self.policy.delay(hint, attempt);
                    tracing::warn!(
                        url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, retrying after backoff"
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(FetchFailure::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                StatusCode::NOT_FOUND => {
                    tracing::debug!("{} returned 404", url);
                    return Err(FetchFailure::NotFound);
                }
                status => {
                    tracing::warn!("{} returned HTTP {}", url, status.as_u16());
                    return Err(FetchFailure::ServerError(status.as_u16()));
                }
            }
        }

        tracing::warn!(
            "Rate limit on {} persisted through {} retries",
            url,
            self.policy.max_retries
        );
        Err(FetchFailure::RateLimited)
    }
}

/// Reads a Retry-After header expressed in whole seconds
///
/// HTTP-date values and malformed headers yield `None` so the default wait
/// applies.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Maps a transport error onto the failure taxonomy
fn classify_error(url: &str, error: &reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        tracing::warn!("Request to {} timed out", url);
        FetchFailure::Timeout
    } else {
        tracing::warn!("Request to {} failed: {}", url, error);
        FetchFailure::Network
    }
}
