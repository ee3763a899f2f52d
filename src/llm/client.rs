//! Blocking chat-completions client for the fallback provider

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::parse::{extract_answer_array, parse_yes_no};
use super::{AnswerGenerator, GeneratedAnswer};
use crate::cancel::CancelToken;
use crate::form::FormQuestion;
use crate::retry::RetryPolicy;

const ANSWER_SYSTEM_PROMPT: &str = "You fill out application forms on behalf of a candidate. \
Answer strictly from the candidate profile; keep answers short and literal. \
For choice questions pick exactly one of the listed options, verbatim. \
Respond with only a JSON array of objects, each with \"label\" and \"answer\" keys, and nothing else.";

const RELEVANCE_SYSTEM_PROMPT: &str = "You screen listing titles against a candidate's keywords. \
Respond with exactly one word: yes or no.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Generative provider speaking the OpenAI-style chat completions
/// protocol over blocking HTTP
pub struct ChatClient {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
    model: String,
    user_information: String,
    retry: RetryPolicy,
    cancel: CancelToken,
}

impl ChatClient {
    pub fn new(
        url: String,
        api_key: String,
        model: String,
        user_information: String,
        retry: RetryPolicy,
        cancel: CancelToken,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url,
            api_key,
            model,
            user_information,
            retry,
            cancel,
        })
    }

    /// One completion round-trip: system + user message in, text out
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("Failed to reach completion endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("Completion endpoint returned {status}: {body}");
        }

        let parsed: ChatResponse = response
            .json()
            .context("Failed to decode completion response")?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .context("Completion response contained no choices")?;

        Ok(choice.message.content)
    }
}

impl AnswerGenerator for ChatClient {
    fn generate_answers(&mut self, questions: &[FormQuestion]) -> Result<Vec<GeneratedAnswer>> {
        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let user = format!(
            "Candidate profile:\n{}\n\nQuestions:\n{}",
            self.user_information,
            render_questions(questions)
        );
        let content = self.retry.run(&self.cancel, "answer generation", || {
            self.complete(ANSWER_SYSTEM_PROMPT, &user)
        })?;

        // Content problems are not transport problems: a response we
        // cannot parse leaves those fields unresolved, it is not retried.
        Ok(extract_answer_array(&content))
    }

    fn classify_relevance(&mut self, subject_text: &str, keywords: &[String]) -> Result<bool> {
        let user = format!(
            "Keywords: {}\n\nListing title: {}\n\nDoes this listing match the keywords?",
            keywords.join(", "),
            subject_text
        );
        let content = self.retry.run(&self.cancel, "relevance classification", || {
            self.complete(RELEVANCE_SYSTEM_PROMPT, &user)
        })?;

        Ok(parse_yes_no(&content))
    }
}

fn render_questions(questions: &[FormQuestion]) -> String {
    let mut block = String::new();
    for question in questions {
        block.push_str("- ");
        block.push_str(&question.label);
        block.push_str(" (");
        block.push_str(question.kind.as_str());
        block.push(')');
        if !question.options.is_empty() {
            block.push_str(" options: ");
            block.push_str(&question.options.join(" | "));
        }
        block.push('\n');
    }
    block
}
