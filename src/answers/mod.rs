//! Answer domain types and the semantic cache resolver
//!
//! These types are storage-agnostic - they don't know about SQLite or
//! the form layer. The resolver mutates candidates in place; whatever
//! ends up filled may be persisted as a new historical answer.

mod resolver;

pub use resolver::{AnswerResolver, ResolverConfig};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Origin of a resolved answer value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Cache,
    Generated,
    Unresolved,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Cache => "cache",
            Provenance::Generated => "generated",
            Provenance::Unresolved => "unresolved",
        }
    }
}

/// One form question awaiting an answer, alive for a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerCandidate {
    pub label: String,
    pub embedding: Vec<f32>,
    pub answer: Option<String>,
    pub provenance: Provenance,
}

impl AnswerCandidate {
    pub fn unresolved(label: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            embedding,
            answer: None,
            provenance: Provenance::Unresolved,
        }
    }

    /// True once a value has been attached, from cache or generation
    pub fn is_resolved(&self) -> bool {
        self.answer.is_some()
    }
}

/// A previously given answer, append-only log owned by storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalAnswer {
    pub label: String,
    pub value: String,
    pub kind: String, // "text", "choice_single", "choice_multi", "long_text"
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

impl HistoricalAnswer {
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
        kind: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            kind: kind.into(),
            embedding,
            created_at: Utc::now(),
        }
    }
}
