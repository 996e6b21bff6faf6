//! Scraper configuration with fail-fast validation.
//!
//! Defaults follow polite-scraping conventions: one request per second, a
//! 30 second request timeout, three attempts per page, and a small fixed pool
//! of browser user agents rotated per request.

use crate::error::ConfigError;
use std::time::Duration;
use url::Url;

/// Default listing site.
pub const DEFAULT_BASE_URL: &str = "https://news.ycombinator.com/";

/// Concurrent mode worker pool width. Kept in low single digits to stay
/// polite; the rate limiter bounds request rate regardless of this value.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for one scraper instance.
///
/// Validation happens once, in [`ScrapeConfig::validate`], before any request
/// is made; a constructed scraper never re-checks these values.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Listing site root. Must parse as a URL and end with `/`.
    pub base_url: String,
    /// Minimum spacing between outbound requests, in seconds. Zero disables
    /// throttling; negative is rejected.
    pub rate_limit: f64,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempts per page, including the first.
    pub max_attempts: u32,
    /// Worker pool width for concurrent mode.
    pub concurrency: usize,
    /// Consecutive page failures that abort a run.
    pub abort_threshold: u32,
    /// Fraction of a page's fragments that may be skipped before the page is
    /// marked parse-partial. Zero means any skip degrades the page.
    pub skip_fraction: f64,
    /// User agents rotated across requests.
    pub user_agents: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit: 1.0,
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            concurrency: DEFAULT_CONCURRENCY,
            abort_threshold: 3,
            skip_fraction: 0.0,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0".to_string(),
            ],
        }
    }
}

impl ScrapeConfig {
    /// Check every invariant the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rate_limit >= 0.0) {
            return Err(ConfigError::NegativeRateLimit(self.rate_limit));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if let Err(e) = Url::parse(&self.base_url) {
            return Err(ConfigError::BadBaseUrl {
                url: self.base_url.clone(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    /// The rate limiter interval as a [`Duration`]. Call only after
    /// [`validate`](Self::validate); a negative value would panic here.
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(self.rate_limit)
    }

    /// Base URL normalized to end with a single `/`, so page URLs can be
    /// appended directly.
    pub fn normalized_base_url(&self) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        format!("{}/", trimmed)
    }
}
