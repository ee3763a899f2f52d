//! Generative fallback gateway
//!
//! Used for exactly two things: drafting answers for questions the
//! semantic cache could not resolve, and yes/no relevance
//! classification of listings. Responses are free-form text and go
//! through the tolerant parsers in [`parse`].

mod client;
pub mod parse;

pub use client::ChatClient;
pub use parse::{extract_answer_array, parse_yes_no};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::form::FormQuestion;

/// One generated label/answer pair from the fallback provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub label: String,
    pub answer: String,
}

/// Trait for generative text providers
pub trait AnswerGenerator {
    /// Draft answers for questions the cache left unresolved
    ///
    /// Best-effort on content: the result may cover only a subset of
    /// the questions, and unanswered ones simply stay blank
    /// downstream. A transport failure that survives the retry policy
    /// is a hard error, never a silent default.
    fn generate_answers(&mut self, questions: &[FormQuestion]) -> Result<Vec<GeneratedAnswer>>;

    /// Binary relevance: does the subject text match the keywords?
    fn classify_relevance(&mut self, subject_text: &str, keywords: &[String]) -> Result<bool>;
}

/// Factory function to create the fallback provider from configuration
pub fn create_generator(config: &Config, cancel: &CancelToken) -> Result<Box<dyn AnswerGenerator>> {
    let api_key = config.providers.api_key()?;
    Ok(Box::new(ChatClient::new(
        config.providers.completions_url.clone(),
        api_key,
        config.providers.completions_model.clone(),
        config.profile.user_information.clone(),
        config.retry.policy(),
        cancel.clone(),
    )?))
}
