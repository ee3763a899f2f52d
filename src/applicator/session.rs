//! Session state for one driven listing

use uuid::Uuid;

/// Why a session ended in `Failed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The form surfaced an error indicator after filling
    FillError,
    /// No submit control and no way to advance
    StuckNoProgress,
    /// Step ceiling hit; the circuit breaker against looping forms
    StepLimitExceeded,
    /// A remote call needed for resolution failed past its retries
    ResolutionFailed(String),
    /// The caller aborted mid-session
    Cancelled(String),
}

impl FailureReason {
    /// Human-readable reason string, as persisted with the status
    pub fn describe(&self) -> String {
        match self {
            FailureReason::FillError => "form reported an error after filling".to_string(),
            FailureReason::StuckNoProgress => {
                "no submit or advance control available".to_string()
            }
            FailureReason::StepLimitExceeded => "step limit exceeded".to_string(),
            FailureReason::ResolutionFailed(detail) => format!("resolution failed: {detail}"),
            FailureReason::Cancelled(reason) => format!("cancelled: {reason}"),
        }
    }

    /// Could a re-run plausibly succeed without human intervention?
    pub fn retryable(&self) -> bool {
        match self {
            FailureReason::ResolutionFailed(_) | FailureReason::Cancelled(_) => true,
            FailureReason::FillError
            | FailureReason::StuckNoProgress
            | FailureReason::StepLimitExceeded => false,
        }
    }
}

/// Where a session currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    ReadyForSubmit,
    Submitted,
    Failed(FailureReason),
}

/// Per-run counters, reported to the caller after a drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Fields answered straight from the cache
    pub cache_hits: u32,
    /// Fields answered by the fallback provider
    pub generated: u32,
    /// Fields actually written into the form
    pub filled: u32,
    /// Fields with a value the filler could not place
    pub skipped: u32,
}

/// One listing's trip through its form, alive for the engine's run
#[derive(Debug, Clone)]
pub struct ApplicationSession {
    pub id: Uuid,
    pub listing_id: String,
    pub step_count: u32,
    pub max_steps: u32,
    pub status: SessionStatus,
    pub stats: SessionStats,
}

impl ApplicationSession {
    pub fn new(listing_id: impl Into<String>, max_steps: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            listing_id: listing_id.into(),
            step_count: 0,
            max_steps,
            status: SessionStatus::InProgress,
            stats: SessionStats::default(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, SessionStatus::InProgress)
    }
}
