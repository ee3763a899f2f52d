//! Persistence for the answer log and listing statuses
//!
//! The answer log is append-only and read in bulk at the start of each
//! resolution batch. Listing statuses are a small upsert table keyed
//! by listing id; the latest terminal outcome wins.

mod sqlite;

pub use sqlite::SqliteStorage;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answers::HistoricalAnswer;

/// Closed status vocabulary for a driven listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    ReadyForSubmit,
    Submitted,
    Failed,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::ReadyForSubmit => "ready_for_submit",
            ListingStatus::Submitted => "submitted",
            ListingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ready_for_submit" => Some(ListingStatus::ReadyForSubmit),
            "submitted" => Some(ListingStatus::Submitted),
            "failed" => Some(ListingStatus::Failed),
            _ => None,
        }
    }
}

/// Terminal outcome of one application session, as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRecord {
    pub listing_id: String,
    pub status: ListingStatus,
    /// Human-readable failure reason; None for clean outcomes
    pub reason: Option<String>,
    /// Whether a re-run could plausibly succeed without human help
    pub retryable: bool,
    pub session_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl ListingRecord {
    pub fn new(listing_id: impl Into<String>, status: ListingStatus) -> Self {
        Self {
            listing_id: listing_id.into(),
            status,
            reason: None,
            retryable: false,
            session_id: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Trait for the persistence collaborator
pub trait Storage {
    /// Append one freshly answered field to the log
    fn append_historical_answer(&mut self, answer: &HistoricalAnswer) -> Result<()>;

    /// Read the whole answer log, oldest first
    ///
    /// Order matters: resolution ties break by first occurrence, so a
    /// stable read order keeps resolution deterministic.
    fn all_historical_answers(&self) -> Result<Vec<HistoricalAnswer>>;

    /// Upsert the terminal status for a listing
    fn set_listing_status(&mut self, record: &ListingRecord) -> Result<()>;

    /// Read all listing statuses, most recently updated first
    fn all_listing_statuses(&self) -> Result<Vec<ListingRecord>>;
}
