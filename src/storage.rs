//! JSON file storage for collected stories.
//!
//! The storage collaborator consumes the ordered record set a run produces
//! and is the only component that touches the on-disk format: a single JSON
//! array at `{data_dir}/stories.json`, plus the latest run report next to it.

use crate::error::StorageError;
use crate::models::{RunReport, Story};
use crate::utils::ensure_writable_dir;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const STORIES_FILE: &str = "stories.json";
const REPORT_FILE: &str = "run_report.json";

/// File-based story storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    stories_path: PathBuf,
    report_path: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) storage under `data_dir`.
    ///
    /// The directory is write-probed up front so permission problems surface
    /// before a scrape, not after.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = data_dir.as_ref();
        ensure_writable_dir(dir)
            .await
            .map_err(|e| StorageError::io(dir.display().to_string(), e))?;
        Ok(FileStorage {
            stories_path: dir.join(STORIES_FILE),
            report_path: dir.join(REPORT_FILE),
        })
    }

    /// Overwrite storage with the given stories.
    #[instrument(level = "info", skip_all, fields(count = stories.len()))]
    pub async fn save_stories(&self, stories: &[Story]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(stories)?;
        fs::write(&self.stories_path, json)
            .await
            .map_err(|e| StorageError::io(self.stories_path.display().to_string(), e))?;
        info!(path = %self.stories_path.display(), "wrote stories");
        Ok(())
    }

    /// Load all stored stories; a missing file is an empty set, not an error.
    pub async fn load_stories(&self) -> Result<Vec<Story>, StorageError> {
        match fs::read_to_string(&self.stories_path).await {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StorageError::io(
                self.stories_path.display().to_string(),
                e,
            )),
        }
    }

    /// Append stories to whatever is already stored.
    ///
    /// Returns the total count after appending.
    pub async fn append_stories(&self, stories: &[Story]) -> Result<usize, StorageError> {
        let mut all = self.load_stories().await?;
        all.extend_from_slice(stories);
        self.save_stories(&all).await?;
        Ok(all.len())
    }

    pub async fn get_story_by_id(&self, story_id: &str) -> Result<Option<Story>, StorageError> {
        let stories = self.load_stories().await?;
        Ok(stories.into_iter().find(|s| s.story_id == story_id))
    }

    pub async fn story_count(&self) -> Result<usize, StorageError> {
        Ok(self.load_stories().await?.len())
    }

    /// The `limit` most recently posted stories, newest first.
    pub async fn get_latest_stories(&self, limit: usize) -> Result<Vec<Story>, StorageError> {
        let mut stories = self.load_stories().await?;
        stories.sort_by(|a, b| b.time.cmp(&a.time));
        stories.truncate(limit);
        Ok(stories)
    }

    /// Remove all stored stories.
    pub async fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.stories_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(
                self.stories_path.display().to_string(),
                e,
            )),
        }
    }

    /// Persist the latest run report beside the stories.
    pub async fn save_report(&self, report: &RunReport) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.report_path, json)
            .await
            .map_err(|e| StorageError::io(self.report_path.display().to_string(), e))?;
        info!(path = %self.report_path.display(), "wrote run report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunStatus;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

    fn scratch_dir() -> PathBuf {
        let n = DIR_SEQ.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "hn_scraper_storage_test_{}_{}",
            std::process::id(),
            n
        ))
    }

    fn story(id: &str) -> Story {
        Story {
            story_id: id.to_string(),
            title: format!("Story {id}"),
            url: Some(format!("https://example.com/{id}")),
            points: 10,
            username: Some("alice".to_string()),
            comment_count: 3,
            time: DateTime::from_timestamp(1_715_000_000, 0).unwrap(),
            page: 1,
        }
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let storage = FileStorage::new(scratch_dir()).await.unwrap();
        let stories = vec![story("1"), story("2"), story("3")];
        storage.save_stories(&stories).await.unwrap();

        let loaded = storage.load_stories().await.unwrap();
        assert_eq!(loaded, stories);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let storage = FileStorage::new(scratch_dir()).await.unwrap();
        assert!(storage.load_stories().await.unwrap().is_empty());
        assert_eq!(storage.story_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_append_preserves_existing() {
        let storage = FileStorage::new(scratch_dir()).await.unwrap();
        storage.save_stories(&[story("1")]).await.unwrap();
        let total = storage.append_stories(&[story("2")]).await.unwrap();
        assert_eq!(total, 2);

        let loaded = storage.load_stories().await.unwrap();
        assert_eq!(loaded[0].story_id, "1");
        assert_eq!(loaded[1].story_id, "2");
    }

    #[tokio::test]
    async fn test_get_story_by_id() {
        let storage = FileStorage::new(scratch_dir()).await.unwrap();
        storage.save_stories(&[story("1"), story("2")]).await.unwrap();

        let found = storage.get_story_by_id("2").await.unwrap();
        assert_eq!(found.unwrap().story_id, "2");
        assert!(storage.get_story_by_id("99").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_stories_sorted_newest_first() {
        let storage = FileStorage::new(scratch_dir()).await.unwrap();
        let mut old = story("old");
        old.time = DateTime::from_timestamp(1_714_000_000, 0).unwrap();
        let mut newest = story("newest");
        newest.time = DateTime::from_timestamp(1_716_000_000, 0).unwrap();
        storage
            .save_stories(&[old, story("mid"), newest])
            .await
            .unwrap();

        let latest = storage.get_latest_stories(2).await.unwrap();
        let ids: Vec<_> = latest.iter().map(|s| s.story_id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "mid"]);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let storage = FileStorage::new(scratch_dir()).await.unwrap();
        storage.save_stories(&[story("1")]).await.unwrap();
        storage.clear().await.unwrap();
        storage.clear().await.unwrap();
        assert_eq!(storage.story_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_report() {
        let storage = FileStorage::new(scratch_dir()).await.unwrap();
        let report = RunReport {
            pages_attempted: 2,
            pages_succeeded: 2,
            records_collected: 4,
            failures: vec![],
            duration: std::time::Duration::from_secs(1),
            status: RunStatus::Completed,
        };
        storage.save_report(&report).await.unwrap();

        let json = fs::read_to_string(storage.report_path.clone()).await.unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
