//! HackerNews listing page parser.
//!
//! A listing page is a table: each story is a `tr.athing` row carrying the
//! story ID and title link, followed by a sibling row whose `.subtext` cell
//! holds the score, submitter, age, and comment count. Extraction anchors on
//! those structural classes rather than absolute positions, so minor markup
//! drift degrades a single fragment instead of the whole page.
//!
//! Malformed input never raises: every fragment resolves to a tagged
//! [`Fragment`] value, and page-level degradation is expressed through
//! [`PageOutcome`] plus a skipped-fragment count.

use crate::models::{PageOutcome, PageResult, Story};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

static STORY_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr.athing").unwrap());
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(".titleline > a").unwrap());
static SUBTEXT: Lazy<Selector> = Lazy::new(|| Selector::parse(".subtext").unwrap());
static SCORE: Lazy<Selector> = Lazy::new(|| Selector::parse(".score").unwrap());
static USER: Lazy<Selector> = Lazy::new(|| Selector::parse(".hnuser").unwrap());
static AGE: Lazy<Selector> = Lazy::new(|| Selector::parse(".age").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static MORE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a.morelink").unwrap());

/// Outcome of parsing one candidate story fragment.
#[derive(Debug)]
pub enum Fragment {
    Parsed(Story),
    Skipped(SkipReason),
}

/// Why a fragment could not be turned into a [`Story`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingId,
    MissingTitle,
    MissingSubtext,
}

/// Turns raw listing HTML into a [`PageResult`].
#[derive(Debug, Clone)]
pub struct ListingParser {
    /// Fraction of fragments allowed to skip before the page degrades to
    /// [`PageOutcome::ParsePartial`].
    skip_fraction: f64,
}

impl ListingParser {
    pub fn new(skip_fraction: f64) -> Self {
        ListingParser { skip_fraction }
    }

    /// Extract stories and the continuation flag from one page's raw content.
    ///
    /// Fragments that cannot be matched to the expected structure are skipped
    /// and counted; absence of the "More" affordance means this is the last
    /// page.
    pub fn parse(&self, page: u32, html: &str) -> PageResult {
        let document = Html::parse_document(html);

        let mut stories = Vec::new();
        let mut skipped = 0u32;
        for row in document.select(&STORY_ROW) {
            match parse_row(page, row) {
                Fragment::Parsed(story) => {
                    debug!(page, story_id = %story.story_id, "parsed story");
                    stories.push(story);
                }
                Fragment::Skipped(reason) => {
                    warn!(page, ?reason, "skipping unparsable story row");
                    skipped += 1;
                }
            }
        }

        let has_more = document.select(&MORE_LINK).next().is_some();
        let candidates = stories.len() as u32 + skipped;
        let outcome = if skipped > 0
            && f64::from(skipped) > self.skip_fraction * f64::from(candidates)
        {
            PageOutcome::ParsePartial
        } else {
            PageOutcome::Success
        };

        debug!(
            page,
            stories = stories.len(),
            skipped,
            has_more,
            ?outcome,
            "parsed listing page"
        );
        PageResult {
            page,
            stories,
            has_more,
            outcome,
            skipped,
        }
    }
}

/// Parse one `tr.athing` row plus its metadata sibling.
fn parse_row(page: u32, row: ElementRef<'_>) -> Fragment {
    let Some(story_id) = row.value().attr("id").filter(|id| !id.is_empty()) else {
        return Fragment::Skipped(SkipReason::MissingId);
    };

    let Some(title_link) = row.select(&TITLE_LINK).next() else {
        return Fragment::Skipped(SkipReason::MissingTitle);
    };
    let title = title_link.text().collect::<String>().trim().to_string();
    if title.is_empty() {
        return Fragment::Skipped(SkipReason::MissingTitle);
    }

    // Discussion-only entries carry a relative `item?id=` href; only absolute
    // outbound links count as a story URL.
    let url = title_link
        .value()
        .attr("href")
        .filter(|href| href.starts_with("http"))
        .map(str::to_string);

    // Metadata lives in the next sibling row's .subtext cell.
    let Some(subtext) = row
        .next_siblings()
        .find_map(ElementRef::wrap)
        .and_then(|sibling| sibling.select(&SUBTEXT).next())
    else {
        return Fragment::Skipped(SkipReason::MissingSubtext);
    };

    let points = subtext
        .select(&SCORE)
        .next()
        .and_then(|el| leading_int(&el.text().collect::<String>()))
        .unwrap_or(0);

    let username = subtext
        .select(&USER)
        .next()
        .map(|el| el.text().collect::<String>())
        .filter(|name| !name.is_empty());

    let time = subtext
        .select(&AGE)
        .next()
        .and_then(parse_age)
        .unwrap_or_else(Utc::now);

    let comment_count = subtext
        .select(&ANCHOR)
        .find(|el| {
            el.text()
                .collect::<String>()
                .to_lowercase()
                .contains("comment")
        })
        .and_then(|el| leading_int(&el.text().collect::<String>()))
        .unwrap_or(0);

    Fragment::Parsed(Story {
        story_id: story_id.to_string(),
        title,
        url,
        points,
        username,
        comment_count,
        time,
        page,
    })
}

/// First whitespace-separated integer in a string, e.g. `"128 points"` -> 128.
fn leading_int(text: &str) -> Option<u32> {
    text.split_whitespace().next()?.parse().ok()
}

/// Best-effort posted time from an `.age` element.
///
/// Prefers the `title` attribute, which carries an exact timestamp (ISO 8601,
/// sometimes followed by a Unix epoch); falls back to the relative display
/// text ("4 hours ago").
fn parse_age(age: ElementRef<'_>) -> Option<DateTime<Utc>> {
    if let Some(title) = age.value().attr("title") {
        if let Some(exact) = parse_exact_timestamp(title) {
            return Some(exact);
        }
    }
    parse_relative(&age.text().collect::<String>())
}

fn parse_exact_timestamp(title: &str) -> Option<DateTime<Utc>> {
    let token = title.split_whitespace().next()?;
    if let Ok(fixed) = DateTime::parse_from_rfc3339(token) {
        return Some(fixed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    // Some variants put only the epoch in the attribute.
    token.parse::<i64>().ok().and_then(|epoch| DateTime::from_timestamp(epoch, 0))
}

fn parse_relative(text: &str) -> Option<DateTime<Utc>> {
    let mut words = text.split_whitespace();
    let amount: i64 = words.next()?.parse().ok()?;
    let unit = words.next()?;
    let delta = if unit.starts_with("minute") {
        TimeDelta::minutes(amount)
    } else if unit.starts_with("hour") {
        TimeDelta::hours(amount)
    } else if unit.starts_with("day") {
        TimeDelta::days(amount)
    } else {
        return None;
    };
    Some(Utc::now() - delta)
}
