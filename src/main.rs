//! # HN Scraper
//!
//! Scrapes HackerNews listing pages into structured story records, persists
//! them as JSON, and derives aggregate statistics (trending keywords and
//! domains, posting-time distribution, score correlation) from the stored
//! collection.
//!
//! ## Usage
//!
//! ```sh
//! hn_scraper scrape --pages 3 --trending
//! hn_scraper analyze --trending
//! ```
//!
//! ## Architecture
//!
//! The pipeline lives in [`scraper`]: rate limiter → page fetcher → item
//! parser → dedup collector, driven by an orchestrator in either sequential
//! or concurrent mode. This binary is glue: it wires CLI options into a
//! [`ScrapeConfig`], runs the orchestrator, hands the record set to
//! [`storage`], and prints [`analysis`] results.

use clap::Parser;
use std::error::Error;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod scraper;
mod storage;
mod utils;

use analysis::StoryAnalyzer;
use cli::{Cli, Command};
use config::ScrapeConfig;
use models::{RunStatus, Story};
use crate::scraper::{FetchMode, HackerNewsScraper};
use storage::FileStorage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();

    let storage = FileStorage::new(&args.data_dir).await.map_err(|e| {
        error!(data_dir = %args.data_dir, error = %e, "data directory is not usable");
        e
    })?;

    match args.command {
        Command::Scrape {
            pages,
            start_page,
            concurrent,
            width,
            rate_limit,
            timeout,
            max_attempts,
            abort_threshold,
            base_url,
            append,
            trending,
        } => {
            let config = ScrapeConfig {
                base_url,
                rate_limit,
                timeout: std::time::Duration::from_secs(timeout),
                max_attempts,
                concurrency: width,
                abort_threshold,
                ..Default::default()
            };
            let mode = if concurrent {
                FetchMode::Concurrent
            } else {
                FetchMode::Sequential
            };
            info!(pages, start_page, ?mode, rate_limit, "starting scrape");

            // InvalidConfig is the only error allowed out before a run starts.
            let scraper = HackerNewsScraper::new(&config)?;

            // Ctrl-C stops dispatching new pages; in-flight fetches finish.
            let cancel = scraper.cancel_flag();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received; cancelling run");
                    cancel.store(true, Ordering::Relaxed);
                }
            });

            let (stories, report) = scraper.run(start_page, pages, mode).await;

            match report.status {
                RunStatus::Completed => info!(records = stories.len(), "run completed"),
                RunStatus::Aborted => warn!(
                    failures = report.failures.len(),
                    "run aborted after repeated failures; saving partial results"
                ),
                RunStatus::Cancelled => warn!(
                    records = stories.len(),
                    "run cancelled; saving partial results"
                ),
            }

            if append {
                let total = storage.append_stories(&stories).await?;
                info!(added = stories.len(), total, "appended stories");
            } else {
                storage.save_stories(&stories).await?;
            }
            storage.save_report(&report).await?;

            println!(
                "Scraped {} stories across {} page(s) ({:?})",
                stories.len(),
                report.pages_succeeded,
                report.status
            );
            if trending {
                print_analysis(stories, true, 10);
            }
        }

        Command::Analyze { trending, top } => {
            let stories = storage.load_stories().await?;
            if stories.is_empty() {
                println!("No stories found to analyze");
                return Ok(());
            }
            print_analysis(stories, trending, top);
        }
    }

    let elapsed = start_time.elapsed();
    info!(secs = elapsed.as_secs(), millis = elapsed.subsec_millis(), "done");
    Ok(())
}

fn print_analysis(stories: Vec<Story>, trending: bool, top: usize) {
    let analyzer = StoryAnalyzer::new(stories);

    let stats = analyzer.basic_stats();
    println!("\nBasic Statistics:");
    println!("Total stories: {}", stats.total_stories);
    println!("Average points: {:.2}", stats.avg_points);
    println!("Average comments: {:.2}", stats.avg_comments);
    println!("Max points: {}", stats.max_points);
    println!("Max comments: {}", stats.max_comments);

    if let Some(r) = analyzer.points_comments_correlation() {
        println!("Points/comments correlation: {r:.3}");
    }

    if trending {
        println!("\nTrending Topics:");
        for (topic, count) in analyzer.trending_topics(top) {
            println!("  {topic}: {count}");
        }

        println!("\nTrending Domains:");
        for (domain, count) in analyzer.trending_domains(top) {
            println!("  {domain}: {count}");
        }

        println!("\nPosts by hour (UTC):");
        for (hour, count) in analyzer.posts_by_hour() {
            println!("  {hour:02}:00  {count}");
        }
    }
}
