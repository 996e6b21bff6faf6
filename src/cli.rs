//! Command-line interface definitions.
//!
//! Two subcommands: `scrape` fetches listing pages and persists the collected
//! stories; `analyze` loads previously stored stories and prints statistics.
//! Options can be provided via flags or, where marked, environment variables.

use clap::{Parser, Subcommand};

/// Command-line arguments for the scraper.
///
/// # Examples
///
/// ```sh
/// # Scrape three pages sequentially at one request per second
/// hn_scraper scrape --pages 3
///
/// # Scrape concurrently with four workers, then show trends
/// hn_scraper scrape --pages 5 --concurrent --trending
///
/// # Analyze whatever is stored
/// hn_scraper analyze --trending --top 15
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory where scraped stories are stored
    #[arg(short, long, env = "HN_DATA_DIR", default_value = "data")]
    pub data_dir: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape listing pages and persist the collected stories
    Scrape {
        /// Number of pages to scrape
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// First page to fetch
        #[arg(long, default_value_t = 1)]
        start_page: u32,

        /// Fetch pages concurrently instead of strictly in order
        #[arg(long)]
        concurrent: bool,

        /// Worker pool width in concurrent mode
        #[arg(long, default_value_t = 4)]
        width: usize,

        /// Minimum seconds between requests
        #[arg(long, default_value_t = 1.0)]
        rate_limit: f64,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Attempts per page, including the first
        #[arg(long, default_value_t = 3)]
        max_attempts: u32,

        /// Consecutive page failures that abort the run
        #[arg(long, default_value_t = 3)]
        abort_threshold: u32,

        /// Listing site root
        #[arg(long, env = "HN_BASE_URL", default_value = crate::config::DEFAULT_BASE_URL)]
        base_url: String,

        /// Append to stored stories instead of overwriting them
        #[arg(long)]
        append: bool,

        /// Print trending topics and domains after scraping
        #[arg(long)]
        trending: bool,
    },

    /// Analyze previously stored stories
    Analyze {
        /// Show trending topics and domains
        #[arg(long)]
        trending: bool,

        /// How many entries each trending list shows
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}
