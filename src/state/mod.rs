//! State module for tracking crawl progress
//!
//! This module provides state management for targets and domains during the crawl process.
//!
//! # Components
//!
//! - `TargetState`: Tracks one crawl target from queued to succeeded or failed
//! - `DomainState`: Per-domain frontier, session, statistics and product set
//! - `Session`: Cookies and local storage carried between requests

mod domain_state;
mod target_state;

// Re-export main types
pub use domain_state::{DomainState, Session};
pub use target_state::{FailureKind, TargetState};
