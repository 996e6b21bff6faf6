//! First-seen-wins deduplication across pages.

use crate::models::{PageResult, Story};
use std::collections::HashSet;
use tracing::debug;

/// Folds page results into a single ordered, duplicate-free record set.
///
/// Insertion order is preserved: output ordering is exactly the order in
/// which records were first accepted, independent of which fetch mode
/// produced the interleaving. A story ID seen once is never overwritten.
#[derive(Debug, Default)]
pub struct Collector {
    seen: HashSet<String>,
    stories: Vec<Story>,
}

impl Collector {
    pub fn new() -> Self {
        Collector::default()
    }

    /// Fold one page's records into the running set.
    ///
    /// Returns the count of newly added records; duplicates are skipped.
    pub fn accept(&mut self, result: &PageResult) -> usize {
        let mut added = 0;
        for story in &result.stories {
            if self.seen.insert(story.story_id.clone()) {
                self.stories.push(story.clone());
                added += 1;
            } else {
                debug!(page = result.page, story_id = %story.story_id, "duplicate story skipped");
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Drain the accumulated set. Consumes the collector, so it can only
    /// happen once per run.
    pub fn finalize(self) -> Vec<Story> {
        self.stories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageOutcome;
    use chrono::DateTime;

    fn story(id: &str, title: &str, page: u32) -> Story {
        Story {
            story_id: id.to_string(),
            title: title.to_string(),
            url: None,
            points: 1,
            username: None,
            comment_count: 0,
            time: DateTime::from_timestamp(1_715_000_000, 0).unwrap(),
            page,
        }
    }

    fn page_result(page: u32, stories: Vec<Story>) -> PageResult {
        PageResult {
            page,
            stories,
            has_more: true,
            outcome: PageOutcome::Success,
            skipped: 0,
        }
    }

    #[test]
    fn test_first_seen_wins_across_pages() {
        let mut collector = Collector::new();
        let added = collector.accept(&page_result(
            1,
            vec![story("1", "from page one", 1), story("2", "also page one", 1)],
        ));
        assert_eq!(added, 2);

        // Same ID reappears on page 2 with a different title.
        let added = collector.accept(&page_result(
            2,
            vec![story("2", "renamed on page two", 2), story("3", "new", 2)],
        ));
        assert_eq!(added, 1);

        let stories = collector.finalize();
        assert_eq!(stories.len(), 3);
        assert_eq!(stories[1].title, "also page one");
        assert_eq!(stories[1].page, 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut collector = Collector::new();
        collector.accept(&page_result(1, vec![story("9", "a", 1), story("4", "b", 1)]));
        collector.accept(&page_result(2, vec![story("7", "c", 2)]));
        let ids: Vec<_> = collector
            .finalize()
            .into_iter()
            .map(|s| s.story_id)
            .collect();
        assert_eq!(ids, vec!["9", "4", "7"]);
    }

    #[test]
    fn test_duplicate_delivery_is_idempotent() {
        let result = page_result(1, vec![story("1", "a", 1), story("2", "b", 1)]);
        let mut collector = Collector::new();
        assert_eq!(collector.accept(&result), 2);
        assert_eq!(collector.accept(&result), 0);
        assert_eq!(collector.len(), 2);

        let ids: Vec<_> = collector
            .finalize()
            .into_iter()
            .map(|s| s.story_id)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_empty_collector() {
        let collector = Collector::new();
        assert!(collector.is_empty());
        assert!(collector.finalize().is_empty());
    }
}
