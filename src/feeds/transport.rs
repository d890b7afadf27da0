//! Feed retrieval with optional retry and exponential backoff.
//!
//! The orchestrator only needs "give me the text behind this URL". That
//! capability is the [`FeedTransport`] trait:
//! - [`HttpTransport`]: `reqwest` client, optionally routed through a
//!   pass-through proxy prefix
//! - [`RetryFetch`]: decorator that adds retry logic to any `FeedTransport`
//!
//! # Retry Strategy
//!
//! - Configurable number of extra attempts (0 disables retrying)
//! - Exponential backoff starting at 500 ms
//! - Maximum delay capped at 10 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! Retries run inside the per-source timeout applied by the orchestrator, so a
//! retrying source can never hold up the batch for longer than that budget.

use rand::{Rng, rng};
use reqwest::Client;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::error::FetchError;

/// Anything that can turn a URL into response text.
pub trait FeedTransport {
    /// Fetch `url` and return the body as text.
    ///
    /// A non-success status must be reported as [`FetchError::Status`].
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    /// Prepended verbatim to every requested URL when set.
    proxy_prefix: Option<String>,
}

impl HttpTransport {
    /// Build a transport with the given user agent and per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the TLS backend cannot be initialised.
    pub fn new(
        user_agent: &str,
        request_timeout: Duration,
        proxy_prefix: Option<String>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            client,
            proxy_prefix,
        })
    }

    /// The URL actually requested for `endpoint`.
    pub fn request_url(&self, endpoint: &str) -> String {
        match &self.proxy_prefix {
            Some(prefix) => format!("{prefix}{endpoint}"),
            None => endpoint.to_string(),
        }
    }
}

impl FeedTransport for HttpTransport {
    #[instrument(level = "debug", skip(self))]
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let target = self.request_url(url);
        let response = self.client.get(&target).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: target,
            });
        }
        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched feed body");
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FeedTransport`].
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    /// The transport doing the actual work.
    inner: T,
    /// Extra attempts after the first failure.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: Duration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: FeedTransport,
{
    pub fn new(inner: T, max_retries: usize) -> Self {
        Self {
            inner,
            max_retries,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }

    #[cfg(test)]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1u32 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FeedTransport for RetryFetch<T>
where
    T: FeedTransport,
{
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.get_text(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(e);
                    }
                    let delay = self.backoff(attempt);
                    warn!(
                        %url,
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        ?delay,
                        error = %e,
                        "Feed fetch failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
