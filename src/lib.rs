//! Product-Scout: a polite product-page discovery crawler
//!
//! This crate crawls e-commerce sites one domain at a time, following links
//! up to a depth budget, and collects the URLs that look like product pages.
//! It respects robots.txt, paces requests, retries transient failures and
//! keeps every domain's crawl independent of the others.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod rules;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Product-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::TargetState,
        to: state::TargetState,
    },

    #[error("Failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid retailer rule for {domain}: {message}")]
    InvalidRule { domain: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, run, CrawlReport};
pub use output::{CrawlResult, StatsSummary};
pub use rules::{LinkClass, RuleRegistry};
pub use state::{DomainState, TargetState};
pub use crate::url::{extract_domain, normalize_url};
