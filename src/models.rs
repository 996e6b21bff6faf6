//! Data models for scraped stories and run outcomes.
//!
//! This module defines the records that flow through the pipeline:
//! - [`Story`]: one normalized listing entry, the unit the whole system exists
//!   to produce
//! - [`PageResult`]: the ephemeral outcome of fetching and parsing one page
//! - [`RunReport`]: the summary handed to the caller alongside the record set
//!
//! Stories are value types: once built by the parser they are never mutated,
//! only copied across component boundaries.

use crate::error::FetchErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single HackerNews story as extracted from a listing page.
///
/// The `story_id` comes from the listing markup and is the dedup key within a
/// run: the first record collected for an ID wins, later duplicates are
/// dropped. `url` is absent for discussion-only entries (Ask HN and similar),
/// which link back into the site rather than out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Source-assigned identifier, unique within a run.
    pub story_id: String,
    /// The story headline.
    pub title: String,
    /// Outbound link, if the story has one.
    pub url: Option<String>,
    /// Upvote count; zero when the listing shows none or it fails to parse.
    pub points: u32,
    /// Submitter, when the listing names one.
    pub username: Option<String>,
    /// Comment count; zero when absent.
    pub comment_count: u32,
    /// When the story was posted, best-effort parsed from the listing.
    pub time: DateTime<Utc>,
    /// Listing page the story was first seen on.
    pub page: u32,
}

impl Story {
    /// Host of the outbound link, e.g. `example.com`.
    ///
    /// Returns `None` for discussion-only stories or unparsable URLs.
    pub fn domain(&self) -> Option<String> {
        let url = self.url.as_deref()?;
        let parsed = url::Url::parse(url).ok()?;
        parsed.host_str().map(str::to_string)
    }
}

/// How fetching and parsing one page went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Page fetched and every candidate fragment parsed.
    Success,
    /// Page fetched but some fragments were skipped as unparsable.
    ParsePartial,
    /// The page could not be fetched at all.
    FetchFailed(FetchErrorKind),
}

/// The output of one fetch-and-parse step, consumed immediately by the
/// collector and then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub page: u32,
    /// Stories in the order they appear on the page.
    pub stories: Vec<Story>,
    /// Whether the page advertises a further page.
    pub has_more: bool,
    pub outcome: PageOutcome,
    /// Candidate fragments that could not be matched to the expected structure.
    pub skipped: u32,
}

impl PageResult {
    /// Result for a page whose fetch failed. Continuation is unknown, so it is
    /// assumed present; the orchestrator keeps going past failed pages anyway.
    pub fn fetch_failed(page: u32, kind: FetchErrorKind) -> Self {
        PageResult {
            page,
            stories: Vec::new(),
            has_more: true,
            outcome: PageOutcome::FetchFailed(kind),
            skipped: 0,
        }
    }
}

/// Terminal state of a scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Pagination was exhausted or the page limit was reached.
    Completed,
    /// The consecutive-failure threshold was hit.
    Aborted,
    /// An external cancellation signal was received.
    Cancelled,
}

/// What went wrong on one page, as recorded in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The page never arrived.
    Fetch(FetchErrorKind),
    /// The page arrived but some fragments were dropped.
    ParseDegraded { skipped: u32 },
}

/// A per-page failure entry in the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page: u32,
    pub kind: FailureKind,
}

/// Summary of one orchestrated scrape, produced exactly once per run.
///
/// Downstream tooling looks at [`RunReport::status`] alone to decide whether
/// the run's output is usable; everything else is diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub pages_attempted: u32,
    pub pages_succeeded: u32,
    pub records_collected: usize,
    pub failures: Vec<PageFailure>,
    pub duration: Duration,
    pub status: RunStatus,
}
