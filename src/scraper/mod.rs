//! The fetch-and-normalize pipeline.
//!
//! Raw paginated listing responses go in, a validated and deduplicated set of
//! [`Story`](crate::models::Story) records comes out. The pieces, leaf first:
//!
//! 1. [`rate_limit`]: minimum spacing between outbound requests, shared by
//!    both fetch modes
//! 2. [`fetch`]: one page retrieval with bounded retry and backoff
//! 3. [`parse`]: listing HTML into candidate records plus a continuation flag
//! 4. [`collect`]: first-seen-wins dedup with stable insertion order
//! 5. [`orchestrator`]: pagination and fetch strategy (sequential or
//!    concurrent), error aggregation, and the final run report

pub mod collect;
pub mod fetch;
pub mod orchestrator;
pub mod parse;
pub mod rate_limit;

pub use fetch::HttpSource;
pub use orchestrator::{FetchMode, HackerNewsScraper};
