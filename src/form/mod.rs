//! Collaborator seams around the live form
//!
//! The engine never touches a real UI. It consumes these traits and
//! leaves locating, clicking and typing to whatever automation layer
//! the caller wires in.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Kind of control a form question renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    ChoiceSingle,
    ChoiceMulti,
    LongText,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::ChoiceSingle => "choice_single",
            QuestionKind::ChoiceMulti => "choice_multi",
            QuestionKind::LongText => "long_text",
        }
    }
}

/// One field descriptor read off the current screen
///
/// Produced fresh each step by the form reader; never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormQuestion {
    pub label: String,
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FormQuestion {
    pub fn new(label: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            label: label.into(),
            kind,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}

/// Per-field result of a fill attempt
///
/// A miss on one field is not a step failure; the engine aggregates
/// these instead of catching exceptions from nested helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Value landed in the control
    Filled,
    /// Control could not be located on the current screen
    NotFound,
    /// Control was located but refused interaction
    Blocked,
}

/// Reads the current screen's field descriptors
pub trait FormReader {
    /// May legitimately return an empty list (review screens)
    fn read_current_screen(&mut self) -> Result<Vec<FormQuestion>>;
}

/// Pushes resolved values into form controls
pub trait FormFiller {
    fn apply(&mut self, question: &FormQuestion, answer: &str) -> FillOutcome;
}

/// Observes and operates the form's chrome: errors, submit, advance
pub trait ScreenNavigator {
    fn has_error_indicator(&mut self) -> bool;
    fn has_submit_control(&mut self) -> bool;
    /// Click a continue/review control; false when none is present
    fn try_advance(&mut self) -> bool;
    /// Click the submit control; false when the click had no effect
    fn try_submit(&mut self) -> bool;
    /// Close the form and throw away any partial input
    fn dismiss_and_discard(&mut self);
}
