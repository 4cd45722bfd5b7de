//! Crawl target state definitions
//!
//! Every target a coordinator picks up moves through these states; illegal
//! moves are rejected.

use crate::ScoutError;
use std::fmt;

/// Why a target failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// robots.txt disallows the URL; not a fault and never counted
    PolicyDenied,
    /// Timeout, connection error, HTTP 5xx or 429
    Transient,
    /// Any other HTTP error, or a URL the fetcher rejects
    Permanent,
}

/// Represents the current state of a crawl target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    // ===== Active States =====
    /// Waiting in the frontier
    Queued,

    /// A fetch attempt is in flight
    Fetching,

    // ===== Terminal States =====
    /// Fetched successfully
    Succeeded,

    /// Failed; `terminal: false` means another attempt will follow
    Failed { kind: FailureKind, terminal: bool },
}

impl TargetState {
    pub const POLICY_DENIED: Self = Self::Failed {
        kind: FailureKind::PolicyDenied,
        terminal: true,
    };

    /// Returns true if no further processing happens in this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed { terminal: true, .. }
        )
    }

    /// Returns true if this final state counts as a failed request
    ///
    /// Policy denials are terminal but never reach the network.
    pub fn counts_as_failure(&self) -> bool {
        matches!(
            self,
            Self::Failed {
                terminal: true,
                kind: FailureKind::Transient | FailureKind::Permanent,
            }
        )
    }

    /// Checks whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: TargetState) -> bool {
        use FailureKind::*;
        use TargetState::*;

        match (*self, next) {
            (Queued, Fetching) => true,
            (Queued, Failed { kind: PolicyDenied, terminal: true }) => true,
            (Fetching, Succeeded) => true,
            (Fetching, Failed { kind: Transient, .. }) => true,
            (Fetching, Failed { kind: Permanent, terminal: true }) => true,
            // Retry after a transient failure, or give up at the ceiling
            (Failed { kind: Transient, terminal: false }, Fetching) => true,
            (
                Failed { kind: Transient, terminal: false },
                Failed { kind: Transient, terminal: true },
            ) => true,
            _ => false,
        }
    }

    /// Moves to `next`, or reports the illegal transition
    pub fn transition(self, next: TargetState) -> Result<TargetState, ScoutError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ScoutError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Succeeded => "succeeded",
            Self::Failed {
                kind: FailureKind::PolicyDenied,
                ..
            } => "policy_denied",
            Self::Failed {
                kind: FailureKind::Transient,
                terminal: false,
            } => "retrying",
            Self::Failed {
                kind: FailureKind::Transient,
                terminal: true,
            } => "failed_transient",
            Self::Failed {
                kind: FailureKind::Permanent,
                ..
            } => "failed_permanent",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
