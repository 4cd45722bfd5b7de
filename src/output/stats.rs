//! Request statistics
//!
//! Each domain keeps its own [`Statistics`] while it crawls; the orchestrator
//! also feeds a shared [`GlobalStats`] so concurrent domains can report into
//! one place without locking.

use crate::output::CrawlResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for one domain
///
/// Only final per-target outcomes are counted, so the total is always
/// `successes + failures`.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    successes: u64,
    failures: u64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started_at = Some(Utc::now());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn record_success(&mut self) {
        self.successes += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn total_requests(&self) -> u64 {
        self.successes + self.failures
    }

    pub fn successful_requests(&self) -> u64 {
        self.successes
    }

    pub fn failed_requests(&self) -> u64 {
        self.failures
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Seconds between start and finish, or zero if either is missing
    pub fn duration_seconds(&self) -> f64 {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => {
                (end - start).num_milliseconds().max(0) as f64 / 1000.0
            }
            _ => 0.0,
        }
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::new(
            self.successes,
            self.failures,
            self.duration_seconds(),
        )
    }
}

/// Run-wide counters shared by every domain's coordinator
#[derive(Debug, Default)]
pub struct GlobalStats {
    successes: AtomicU64,
    failures: AtomicU64,
}

impl GlobalStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self, duration_seconds: f64) -> StatsSummary {
        StatsSummary::new(
            self.successes.load(Ordering::Relaxed),
            self.failures.load(Ordering::Relaxed),
            duration_seconds,
        )
    }
}

/// Flat statistics record exposed to callers and printed at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Successful over total, as a fraction; 0 when nothing was requested
    pub success_rate: f64,
    pub total_duration_seconds: f64,
}

impl StatsSummary {
    pub fn new(successful_requests: u64, failed_requests: u64, total_duration_seconds: f64) -> Self {
        let total_requests = successful_requests + failed_requests;
        let success_rate = if total_requests > 0 {
            successful_requests as f64 / total_requests as f64
        } else {
            0.0
        };

        Self {
            total_requests,
            successful_requests,
            failed_requests,
            success_rate,
            total_duration_seconds,
        }
    }
}

/// Prints run statistics to stdout
pub fn print_statistics(
    totals: &StatsSummary,
    domains: &BTreeMap<String, StatsSummary>,
    results: &CrawlResult,
) {
    println!("\nCrawling Statistics:");
    println!("Total Requests: {}", totals.total_requests);
    println!("Successful Requests: {}", totals.successful_requests);
    println!("Failed Requests: {}", totals.failed_requests);
    println!("Success Rate: {:.2}%", totals.success_rate * 100.0);
    println!("Total Duration: {:.2} seconds", totals.total_duration_seconds);

    println!("\nProducts by Domain:");
    for (domain, urls) in results.iter() {
        match domains.get(domain) {
            Some(stats) => println!(
                "  {}: {} product URLs ({} requests, {} failed)",
                domain,
                urls.len(),
                stats.total_requests,
                stats.failed_requests
            ),
            None => println!("  {}: {} product URLs", domain, urls.len()),
        }
    }
}
