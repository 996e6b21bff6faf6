//! Small filesystem helpers shared by storage and startup checks.

use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Ensure a directory exists and is writable.
///
/// Creates the directory if missing, then performs a write test by creating
/// and immediately deleting a probe file. Run before scraping so permission
/// problems surface up front.
pub async fn ensure_writable_dir(path: &Path) -> Result<(), std::io::Error> {
    fs::create_dir_all(path).await?;
    // Small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!(path = %path.display(), "data directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = std::env::temp_dir().join(format!(
            "hn_scraper_utils_test_{}",
            std::process::id()
        ));
        let _ = stdfs::remove_dir_all(&dir);
        ensure_writable_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        // no probe file left behind
        assert!(!dir.join("..__probe_write__").exists());
    }

    #[tokio::test]
    async fn test_existing_directory_is_fine() {
        let dir = std::env::temp_dir();
        ensure_writable_dir(&dir).await.unwrap();
    }
}
