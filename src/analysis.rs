//! Aggregate statistics over a stored story collection.
//!
//! Read-only consumer of the record set: trending title keywords, trending
//! domains, temporal posting distribution, and the points/comments score
//! correlation. All output is plain data for the CLI to print; nothing here
//! touches the network or disk.

use crate::models::Story;
use chrono::Timelike;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Words too common to be trends.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "is", "are", "was", "how", "why", "what", "your", "my", "its", "it", "i", "you", "we",
        "from", "as", "vs",
    ]
    .into_iter()
    .collect()
});

/// Basic aggregate numbers over the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicStats {
    pub total_stories: usize,
    pub avg_points: f64,
    pub avg_comments: f64,
    pub max_points: u32,
    pub max_comments: u32,
}

/// Analyzes a story collection for trends and patterns.
pub struct StoryAnalyzer {
    stories: Vec<Story>,
}

impl StoryAnalyzer {
    pub fn new(stories: Vec<Story>) -> Self {
        StoryAnalyzer { stories }
    }

    pub fn basic_stats(&self) -> BasicStats {
        let n = self.stories.len();
        let total_points: u64 = self.stories.iter().map(|s| u64::from(s.points)).sum();
        let total_comments: u64 = self.stories.iter().map(|s| u64::from(s.comment_count)).sum();
        BasicStats {
            total_stories: n,
            avg_points: if n > 0 { total_points as f64 / n as f64 } else { 0.0 },
            avg_comments: if n > 0 { total_comments as f64 / n as f64 } else { 0.0 },
            max_points: self.stories.iter().map(|s| s.points).max().unwrap_or(0),
            max_comments: self
                .stories
                .iter()
                .map(|s| s.comment_count)
                .max()
                .unwrap_or(0),
        }
    }

    /// Most frequent title words, stopwords removed.
    ///
    /// Ties break alphabetically so output is deterministic.
    pub fn trending_topics(&self, top_n: usize) -> Vec<(String, usize)> {
        let counts: HashMap<String, usize> = self
            .stories
            .iter()
            .flat_map(|s| {
                WORD.find_iter(&s.title)
                    .map(|m| m.as_str().to_lowercase())
                    .collect::<Vec<_>>()
            })
            .filter(|word| !STOPWORDS.contains(word.as_str()))
            .counts();
        top_counts(counts, top_n)
    }

    /// Most frequent outbound-link domains.
    pub fn trending_domains(&self, top_n: usize) -> Vec<(String, usize)> {
        let counts: HashMap<String, usize> =
            self.stories.iter().filter_map(Story::domain).counts();
        top_counts(counts, top_n)
    }

    /// How many stories were posted in each hour of the day (UTC).
    pub fn posts_by_hour(&self) -> BTreeMap<u32, usize> {
        let mut hours = BTreeMap::new();
        for story in &self.stories {
            *hours.entry(story.time.hour()).or_insert(0) += 1;
        }
        hours
    }

    /// Pearson correlation between points and comment counts.
    ///
    /// `None` when there are fewer than two stories or either variable has
    /// zero variance.
    pub fn points_comments_correlation(&self) -> Option<f64> {
        let n = self.stories.len();
        if n < 2 {
            return None;
        }
        let xs: Vec<f64> = self.stories.iter().map(|s| f64::from(s.points)).collect();
        let ys: Vec<f64> = self
            .stories
            .iter()
            .map(|s| f64::from(s.comment_count))
            .collect();
        let mean_x = xs.iter().sum::<f64>() / n as f64;
        let mean_y = ys.iter().sum::<f64>() / n as f64;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (x, y) in xs.iter().zip(&ys) {
            cov += (x - mean_x) * (y - mean_y);
            var_x += (x - mean_x).powi(2);
            var_y += (y - mean_y).powi(2);
        }
        if var_x == 0.0 || var_y == 0.0 {
            return None;
        }
        Some(cov / (var_x.sqrt() * var_y.sqrt()))
    }
}

fn top_counts(counts: HashMap<String, usize>, top_n: usize) -> Vec<(String, usize)> {
    counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .take(top_n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn story(id: &str, title: &str, url: Option<&str>, points: u32, comments: u32, hour: u32) -> Story {
        Story {
            story_id: id.to_string(),
            title: title.to_string(),
            url: url.map(str::to_string),
            points,
            username: Some("alice".to_string()),
            comment_count: comments,
            time: Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).unwrap(),
            page: 1,
        }
    }

    fn sample() -> Vec<Story> {
        vec![
            story("1", "Rust in the Kernel", Some("https://lwn.net/a"), 100, 50, 9),
            story("2", "Why Rust Is Fast", Some("https://example.com/b"), 200, 100, 9),
            story("3", "Ask HN: Rust or Go?", None, 50, 25, 14),
            story("4", "The Go Runtime", Some("https://example.com/c"), 10, 5, 22),
        ]
    }

    #[test]
    fn test_basic_stats() {
        let stats = StoryAnalyzer::new(sample()).basic_stats();
        assert_eq!(stats.total_stories, 4);
        assert_eq!(stats.avg_points, 90.0);
        assert_eq!(stats.avg_comments, 45.0);
        assert_eq!(stats.max_points, 200);
        assert_eq!(stats.max_comments, 100);
    }

    #[test]
    fn test_basic_stats_empty() {
        let stats = StoryAnalyzer::new(vec![]).basic_stats();
        assert_eq!(stats.total_stories, 0);
        assert_eq!(stats.avg_points, 0.0);
        assert_eq!(stats.max_points, 0);
    }

    #[test]
    fn test_trending_topics_drops_stopwords() {
        let topics = StoryAnalyzer::new(sample()).trending_topics(5);
        assert_eq!(topics[0], ("rust".to_string(), 3));
        assert!(topics.iter().all(|(w, _)| !STOPWORDS.contains(w.as_str())));
        assert!(topics.iter().any(|(w, c)| w == "go" && *c == 2));
    }

    #[test]
    fn test_trending_domains_ignores_discussion_only() {
        let domains = StoryAnalyzer::new(sample()).trending_domains(5);
        assert_eq!(domains[0], ("example.com".to_string(), 2));
        assert_eq!(domains[1], ("lwn.net".to_string(), 1));
        assert_eq!(domains.len(), 2);
    }

    #[test]
    fn test_posts_by_hour() {
        let hours = StoryAnalyzer::new(sample()).posts_by_hour();
        assert_eq!(hours.get(&9), Some(&2));
        assert_eq!(hours.get(&14), Some(&1));
        assert_eq!(hours.get(&22), Some(&1));
        assert_eq!(hours.get(&3), None);
    }

    #[test]
    fn test_correlation_perfectly_linear() {
        // comments = points / 2 everywhere, so r == 1
        let r = StoryAnalyzer::new(sample()).points_comments_correlation().unwrap();
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_undefined_cases() {
        assert_eq!(StoryAnalyzer::new(vec![]).points_comments_correlation(), None);

        let constant = vec![
            story("1", "a", None, 10, 1, 0),
            story("2", "b", None, 10, 2, 0),
        ];
        // zero variance in points
        assert_eq!(
            StoryAnalyzer::new(constant).points_comments_correlation(),
            None
        );
    }
}
