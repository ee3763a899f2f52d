//! Terminal-state classification into the persisted status vocabulary

use super::session::{ApplicationSession, SessionStatus};
use crate::storage::{ListingRecord, ListingStatus};

/// Map a finished session to the record the storage layer understands
///
/// Returns None while the session is still in progress; the engine
/// only classifies once a terminal status is reached. Failure reasons
/// keep their human-readable detail so re-runs can tell "needs a
/// human" apart from "transient, retry later".
pub fn classify(session: &ApplicationSession) -> Option<ListingRecord> {
    let record = match &session.status {
        SessionStatus::InProgress => return None,
        SessionStatus::ReadyForSubmit => {
            ListingRecord::new(&session.listing_id, ListingStatus::ReadyForSubmit)
        }
        SessionStatus::Submitted => {
            ListingRecord::new(&session.listing_id, ListingStatus::Submitted)
        }
        SessionStatus::Failed(reason) => {
            ListingRecord::new(&session.listing_id, ListingStatus::Failed)
                .with_reason(reason.describe())
                .with_retryable(reason.retryable())
        }
    };

    Some(record.with_session(session.id))
}
