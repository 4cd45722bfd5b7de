//! Output module for crawl results and statistics
//!
//! This module handles:
//! - Collecting product URLs per domain
//! - Writing them to a JSON file
//! - Recording and printing request statistics

mod results;
pub mod stats;

pub use results::{write_results, CrawlResult};
pub use stats::{print_statistics, GlobalStats, Statistics, StatsSummary};
