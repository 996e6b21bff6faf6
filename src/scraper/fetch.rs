//! Page fetching with retry, exponential backoff, and rate limiting.
//!
//! # Architecture
//!
//! The module uses a trait-based design for testability:
//! - [`PageSource`]: the raw transport seam (one HTTP GET)
//! - [`HttpSource`]: the production implementation over a shared `reqwest`
//!   client
//! - [`PageFetcher`]: retry policy and status classification layered on any
//!   `PageSource`
//!
//! # Retry Strategy
//!
//! - Up to `max_attempts` attempts per page (including the first)
//! - Exponential backoff starting at 1 second, capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//! - Every attempt takes a rate-limiter slot first, so retries cannot bypass
//!   the request-spacing policy
//! - 4xx responses short-circuit: the server answered, retrying is pointless

use crate::error::{FetchError, FetchErrorKind, SourceError};
use crate::scraper::rate_limit::RateLimiter;
use rand::{Rng, rng};
use reqwest::header::USER_AGENT;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

const FALLBACK_USER_AGENT: &str = concat!("hn_scraper/", env!("CARGO_PKG_VERSION"));

/// A raw page response: observed status plus body, before any classification.
#[derive(Debug, Clone)]
pub struct SourceResponse {
    pub status: u16,
    pub body: String,
}

/// One HTTP GET against the listing site.
///
/// Implementations return `Ok` for *any* status code the server produced;
/// only transport-level failures (timeout, refused connection) are errors.
/// Retry policy lives entirely in [`PageFetcher`].
pub trait PageSource {
    async fn get(&self, url: &str, user_agent: &str) -> Result<SourceResponse, SourceError>;
}

/// Production [`PageSource`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpSource { client })
    }
}

impl PageSource for HttpSource {
    async fn get(&self, url: &str, user_agent: &str) -> Result<SourceResponse, SourceError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(classify_transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_transport)?;
        Ok(SourceResponse { status, body })
    }
}

fn classify_transport(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Connect(e.to_string())
    }
}

/// Fetches one listing page with bounded retry.
///
/// The page URL is built deterministically from the base URL and page number
/// (`{base}news?p={page}`). Transient failures (timeout, connection reset,
/// 5xx) are retried with exponential backoff; 4xx or exhausted attempts yield
/// a [`FetchError`] carrying the page number and attempt count.
pub struct PageFetcher<S> {
    source: S,
    limiter: Arc<RateLimiter>,
    base_url: String,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    user_agents: Vec<String>,
}

impl<S: PageSource> PageFetcher<S> {
    pub fn new(
        source: S,
        limiter: Arc<RateLimiter>,
        base_url: String,
        max_attempts: u32,
        user_agents: Vec<String>,
    ) -> Self {
        PageFetcher {
            source,
            limiter,
            base_url,
            max_attempts,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            user_agents,
        }
    }

    /// The listing URL for a page number.
    pub fn page_url(&self, page: u32) -> String {
        format!("{}news?p={}", self.base_url, page)
    }

    /// Fetch one page, retrying transient failures.
    ///
    /// # Returns
    ///
    /// The raw body plus observed status on success, or a [`FetchError`]
    /// classifying why the page is unobtainable.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, page: u32) -> Result<SourceResponse, FetchError> {
        let url = self.page_url(page);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.limiter.acquire().await;

            let ua = self.pick_user_agent();
            let kind = match self.source.get(&url, ua).await {
                Ok(resp) if (200..300).contains(&resp.status) => {
                    debug!(page, status = resp.status, attempt, "page fetched");
                    return Ok(resp);
                }
                Ok(resp) if resp.status >= 500 => {
                    warn!(page, status = resp.status, attempt, "server error");
                    FetchErrorKind::Unreachable
                }
                Ok(resp) => {
                    // 3xx left over after redirects, or a 4xx refusal
                    warn!(page, status = resp.status, attempt, "request refused");
                    return Err(FetchError {
                        kind: FetchErrorKind::Blocked,
                        page,
                        attempts: attempt,
                    });
                }
                Err(SourceError::Timeout) => {
                    warn!(page, attempt, "request timed out");
                    FetchErrorKind::Timeout
                }
                Err(SourceError::Connect(reason)) => {
                    warn!(page, attempt, %reason, "connection failed");
                    FetchErrorKind::Unreachable
                }
            };

            if attempt >= self.max_attempts {
                return Err(FetchError {
                    kind,
                    page,
                    attempts: attempt,
                });
            }

            let delay = self.backoff_delay(attempt);
            warn!(page, attempt, max = self.max_attempts, ?delay, "backing off before retry");
            sleep(delay).await;
        }
    }

    fn pick_user_agent(&self) -> &str {
        if self.user_agents.is_empty() {
            return FALLBACK_USER_AGENT;
        }
        let i = rng().random_range(0..self.user_agents.len());
        &self.user_agents[i]
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
        if delay > self.max_delay {
            delay = self.max_delay;
        }
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls with the given error, then succeeds.
    struct FlakySource {
        failures: u32,
        error: SourceError,
        calls: AtomicU32,
    }

    impl FlakySource {
        fn new(failures: u32, error: SourceError) -> Self {
            FlakySource {
                failures,
                error,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl PageSource for FlakySource {
        async fn get(&self, _url: &str, _ua: &str) -> Result<SourceResponse, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(self.error.clone())
            } else {
                Ok(SourceResponse {
                    status: 200,
                    body: "<html></html>".to_string(),
                })
            }
        }
    }

    /// Always answers with a fixed status.
    struct StatusSource {
        status: u16,
        calls: AtomicU32,
    }

    impl PageSource for StatusSource {
        async fn get(&self, _url: &str, _ua: &str) -> Result<SourceResponse, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SourceResponse {
                status: self.status,
                body: String::new(),
            })
        }
    }

    fn fetcher<S: PageSource>(source: S, max_attempts: u32) -> PageFetcher<S> {
        PageFetcher::new(
            source,
            Arc::new(RateLimiter::new(Duration::ZERO)),
            "https://news.ycombinator.com/".to_string(),
            max_attempts,
            Vec::new(),
        )
    }

    #[test]
    fn test_page_url_construction() {
        let f = fetcher(StatusSource { status: 200, calls: AtomicU32::new(0) }, 1);
        assert_eq!(f.page_url(1), "https://news.ycombinator.com/news?p=1");
        assert_eq!(f.page_url(7), "https://news.ycombinator.com/news?p=7");
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_failures_then_success_uses_three_attempts() {
        let f = fetcher(
            FlakySource::new(2, SourceError::Connect("reset".into())),
            3,
        );
        let resp = f.fetch(1).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(f.source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_report_attempt_count() {
        let f = fetcher(FlakySource::new(u32::MAX, SourceError::Timeout), 3);
        let err = f.fetch(5).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Timeout);
        assert_eq!(err.page, 5);
        assert_eq!(err.attempts, 3);
        assert_eq!(f.source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_4xx_short_circuits_without_retry() {
        let source = StatusSource {
            status: 403,
            calls: AtomicU32::new(0),
        };
        let f = fetcher(source, 3);
        let err = f.fetch(2).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Blocked);
        assert_eq!(err.attempts, 1);
        assert_eq!(f.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_5xx_is_retried_and_ends_unreachable() {
        let source = StatusSource {
            status: 503,
            calls: AtomicU32::new(0),
        };
        let f = fetcher(source, 2);
        let err = f.fetch(1).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Unreachable);
        assert_eq!(f.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_takes_a_limiter_slot() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(200)));
        let f = PageFetcher::new(
            FlakySource::new(2, SourceError::Connect("reset".into())),
            Arc::clone(&limiter),
            "https://news.ycombinator.com/".to_string(),
            3,
            Vec::new(),
        );
        let t0 = tokio::time::Instant::now();
        f.fetch(1).await.unwrap();
        // 3 attempts means 3 grants: two 200ms gaps at minimum, on top of
        // the backoff sleeps between attempts.
        assert!(t0.elapsed() >= Duration::from_millis(400));
    }
}
