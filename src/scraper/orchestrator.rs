//! Scrape orchestration: pagination, fetch strategy, and run reporting.
//!
//! The orchestrator drives the pipeline end to end in one of two modes:
//!
//! - **Sequential**: pages fetched strictly in increasing order, each blocking
//!   until complete.
//! - **Concurrent**: up to `concurrency` pages in flight at once. Because the
//!   true page count is only discovered through continuation links, pages are
//!   fetched speculatively; results park in a page-indexed buffer and are
//!   released to the collector strictly in ascending page order, so the final
//!   record ordering is identical to sequential mode for the same inputs.
//!
//! Per-page errors are data, not control flow: a run always produces a
//! [`RunReport`], and the only error that can reach the caller is an invalid
//! configuration rejected at construction time.

use crate::config::ScrapeConfig;
use crate::error::ConfigError;
use crate::models::{FailureKind, PageFailure, PageOutcome, PageResult, RunReport, RunStatus, Story};
use crate::scraper::collect::Collector;
use crate::scraper::fetch::{HttpSource, PageFetcher, PageSource};
use crate::scraper::parse::ListingParser;
use crate::scraper::rate_limit::RateLimiter;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Fetch strategy for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Sequential,
    Concurrent,
}

struct RunState {
    collector: Collector,
    pages_attempted: u32,
    pages_succeeded: u32,
    failures: Vec<PageFailure>,
    status: RunStatus,
}

impl RunState {
    fn new() -> Self {
        RunState {
            collector: Collector::new(),
            pages_attempted: 0,
            pages_succeeded: 0,
            failures: Vec::new(),
            status: RunStatus::Completed,
        }
    }
}

/// Record a page's outcome in the report tallies.
///
/// Returns `true` when the page's fetch failed outright; parse-partial pages
/// count as succeeded (they still yielded records) but leave a failure entry.
fn record_outcome(state: &mut RunState, result: &PageResult) -> bool {
    match result.outcome {
        PageOutcome::FetchFailed(kind) => {
            state.failures.push(PageFailure {
                page: result.page,
                kind: FailureKind::Fetch(kind),
            });
            true
        }
        PageOutcome::ParsePartial => {
            state.pages_succeeded += 1;
            state.failures.push(PageFailure {
                page: result.page,
                kind: FailureKind::ParseDegraded {
                    skipped: result.skipped,
                },
            });
            false
        }
        PageOutcome::Success => {
            state.pages_succeeded += 1;
            false
        }
    }
}

/// The scrape orchestrator, generic over the transport seam so tests can run
/// against canned pages.
pub struct HackerNewsScraper<S> {
    fetcher: PageFetcher<S>,
    parser: ListingParser,
    abort_threshold: u32,
    concurrency: usize,
    cancel: Arc<AtomicBool>,
}

impl HackerNewsScraper<HttpSource> {
    /// Build a scraper over a live HTTP client.
    ///
    /// # Errors
    ///
    /// Fails fast on invalid configuration; this is the only point where an
    /// error escapes to the caller.
    pub fn new(config: &ScrapeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let source = HttpSource::new(config.timeout)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Self::with_source(config, source)
    }
}

impl<S: PageSource> HackerNewsScraper<S> {
    /// Build a scraper over an arbitrary [`PageSource`].
    pub fn with_source(config: &ScrapeConfig, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let limiter = Arc::new(RateLimiter::new(config.min_interval()));
        let fetcher = PageFetcher::new(
            source,
            limiter,
            config.normalized_base_url(),
            config.max_attempts,
            config.user_agents.clone(),
        );
        Ok(HackerNewsScraper {
            fetcher,
            parser: ListingParser::new(config.skip_fraction),
            abort_threshold: config.abort_threshold,
            concurrency: config.concurrency,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle for signalling cancellation from outside the run (e.g. Ctrl-C).
    ///
    /// On receipt, in-flight fetches complete naturally, no new pages are
    /// dispatched, and the run finalizes as [`RunStatus::Cancelled`].
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Scrape up to `page_limit` pages starting at `start_page`.
    ///
    /// Always returns the collected records and a report; failures along the
    /// way are recorded, never raised.
    #[instrument(level = "info", skip(self))]
    pub async fn run(
        &self,
        start_page: u32,
        page_limit: u32,
        mode: FetchMode,
    ) -> (Vec<Story>, RunReport) {
        let t0 = Instant::now();
        let mut state = RunState::new();

        match mode {
            FetchMode::Sequential => {
                self.run_sequential(start_page, page_limit, &mut state).await
            }
            FetchMode::Concurrent => {
                self.run_concurrent(start_page, page_limit, &mut state).await
            }
        }

        let RunState {
            collector,
            pages_attempted,
            pages_succeeded,
            failures,
            status,
        } = state;
        let stories = collector.finalize();
        let report = RunReport {
            pages_attempted,
            pages_succeeded,
            records_collected: stories.len(),
            failures,
            duration: t0.elapsed(),
            status,
        };
        info!(
            pages_attempted = report.pages_attempted,
            pages_succeeded = report.pages_succeeded,
            records = report.records_collected,
            failures = report.failures.len(),
            status = ?report.status,
            elapsed_ms = report.duration.as_millis() as u64,
            "scrape run finished"
        );
        (stories, report)
    }

    async fn fetch_and_parse(&self, page: u32) -> PageResult {
        match self.fetcher.fetch(page).await {
            Ok(resp) => self.parser.parse(page, &resp.body),
            Err(e) => {
                warn!(page, error = %e, "page fetch failed");
                PageResult::fetch_failed(e.page, e.kind)
            }
        }
    }

    async fn run_sequential(&self, start_page: u32, page_limit: u32, state: &mut RunState) {
        let mut consecutive_failures = 0u32;
        for page in start_page..start_page.saturating_add(page_limit) {
            if self.cancel.load(Ordering::Relaxed) {
                info!(page, "cancellation received; stopping run");
                state.status = RunStatus::Cancelled;
                break;
            }
            state.pages_attempted += 1;
            let result = self.fetch_and_parse(page).await;
            if record_outcome(state, &result) {
                consecutive_failures += 1;
                if consecutive_failures >= self.abort_threshold {
                    warn!(
                        page,
                        threshold = self.abort_threshold,
                        "consecutive page failures reached threshold; aborting run"
                    );
                    state.status = RunStatus::Aborted;
                    break;
                }
                continue;
            }
            consecutive_failures = 0;
            let added = state.collector.accept(&result);
            debug!(page, added, found = result.stories.len(), "page collected");
            if !result.has_more {
                info!(page, "no continuation; last page reached");
                break;
            }
        }
    }

    /// Concurrent driver.
    ///
    /// Dispatch is lazy: `buffer_unordered` pulls a new page future only when
    /// a worker slot frees up, so at most `concurrency` pages can be in flight
    /// past the discovered last page. The `cutoff` watermark (lowest released
    /// page with no continuation) stops further dispatch; overshoot pages
    /// already in flight have their outcomes recorded for diagnostics but
    /// their records are discarded.
    async fn run_concurrent(&self, start_page: u32, page_limit: u32, state: &mut RunState) {
        let end = start_page.saturating_add(page_limit);
        let cutoff = AtomicU32::new(u32::MAX);
        let halted = AtomicBool::new(false);

        let mut arrivals = stream::iter(start_page..end)
            .map(|page| {
                let cutoff = &cutoff;
                let halted = &halted;
                async move {
                    if halted.load(Ordering::Relaxed)
                        || self.cancel.load(Ordering::Relaxed)
                        || page > cutoff.load(Ordering::Relaxed)
                    {
                        return (page, None);
                    }
                    (page, Some(self.fetch_and_parse(page).await))
                }
            })
            .buffer_unordered(self.concurrency);

        // Results park here until every lower-numbered page has been
        // released; this buffer is what makes concurrent output ordering
        // identical to sequential.
        let mut pending: BTreeMap<u32, Option<PageResult>> = BTreeMap::new();
        let mut next_release = start_page;
        let mut consecutive_failures = 0u32;

        'drain: while let Some((page, slot)) = arrivals.next().await {
            if slot.is_some() {
                state.pages_attempted += 1;
            }
            pending.insert(page, slot);

            while let Some(slot) = pending.remove(&next_release) {
                let released = next_release;
                next_release += 1;
                let Some(result) = slot else {
                    // never dispatched (cancelled or past the cutoff)
                    continue;
                };

                let fetch_failed = record_outcome(state, &result);
                if released > cutoff.load(Ordering::Relaxed) {
                    debug!(page = released, "overshoot past last page; records discarded");
                    continue;
                }
                if fetch_failed {
                    consecutive_failures += 1;
                    if consecutive_failures >= self.abort_threshold {
                        warn!(
                            page = released,
                            threshold = self.abort_threshold,
                            "consecutive page failures reached threshold; aborting run"
                        );
                        state.status = RunStatus::Aborted;
                        halted.store(true, Ordering::Relaxed);
                        break 'drain;
                    }
                    continue;
                }
                consecutive_failures = 0;
                let added = state.collector.accept(&result);
                debug!(page = released, added, "page delivered in order");
                if !result.has_more {
                    info!(page = released, "no continuation; last page reached");
                    cutoff.fetch_min(released, Ordering::Relaxed);
                }
            }
        }

        if state.status == RunStatus::Completed && self.cancel.load(Ordering::Relaxed) {
            state.status = RunStatus::Cancelled;
        }
    }
}
