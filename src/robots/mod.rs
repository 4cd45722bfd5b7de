//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files, and answers allow/deny and crawl-delay questions for
//! the URLs a domain's crawl wants to fetch.

mod gate;
mod parser;

pub use gate::RobotsGate;
pub use parser::{ParsedRobots, MAX_CRAWL_DELAY};
