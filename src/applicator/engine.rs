//! The bounded step state machine
//!
//! Drives one listing's form screen by screen: read descriptors,
//! resolve answers (cache first, generation second), fill, then check
//! error/submit/advance in that order. Every run ends in a terminal
//! status which is classified and persisted before returning.

use anyhow::Result;

use super::outcome::classify;
use super::session::{ApplicationSession, FailureReason, SessionStats, SessionStatus};
use crate::answers::{AnswerCandidate, AnswerResolver, HistoricalAnswer, Provenance, ResolverConfig};
use crate::cancel::{is_cancellation, CancelToken, Cancelled};
use crate::embeddings::EmbeddingEngine;
use crate::form::{FillOutcome, FormFiller, FormQuestion, FormReader, ScreenNavigator};
use crate::llm::AnswerGenerator;
use crate::storage::Storage;

/// Engine configuration
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub resolver: ResolverConfig,
    /// Step ceiling; the circuit breaker against looping forms
    pub max_steps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            max_steps: 10,
        }
    }
}

/// Borrowed handles to everything the engine consumes
///
/// The set of collaborators is fixed and small, so it is declared
/// statically here rather than discovered through any registry.
pub struct Collaborators<'a> {
    pub reader: &'a mut dyn FormReader,
    pub filler: &'a mut dyn FormFiller,
    pub navigator: &'a mut dyn ScreenNavigator,
    pub embedder: &'a mut dyn EmbeddingEngine,
    pub generator: &'a mut dyn AnswerGenerator,
    pub storage: &'a mut dyn Storage,
}

/// Drives one listing's form to a terminal outcome
pub struct ApplyEngine<'a> {
    reader: &'a mut dyn FormReader,
    filler: &'a mut dyn FormFiller,
    navigator: &'a mut dyn ScreenNavigator,
    embedder: &'a mut dyn EmbeddingEngine,
    generator: &'a mut dyn AnswerGenerator,
    storage: &'a mut dyn Storage,
    resolver: AnswerResolver,
    max_steps: u32,
    cancel: CancelToken,
}

impl<'a> ApplyEngine<'a> {
    pub fn new(collaborators: Collaborators<'a>, config: EngineConfig, cancel: CancelToken) -> Self {
        let Collaborators {
            reader,
            filler,
            navigator,
            embedder,
            generator,
            storage,
        } = collaborators;

        Self {
            reader,
            filler,
            navigator,
            embedder,
            generator,
            storage,
            resolver: AnswerResolver::new(config.resolver),
            max_steps: config.max_steps,
            cancel,
        }
    }

    /// Drive the listing's form until a terminal status is reached
    ///
    /// With `submit == false` the run stops at `ReadyForSubmit` when a
    /// submit control appears; nothing is ever submitted. Domain
    /// failures (stuck forms, exhausted retries, cancellation) land in
    /// the returned session's status; an `Err` here means the
    /// automation layer itself broke and no outcome was recorded.
    pub fn drive(&mut self, listing_id: &str, submit: bool) -> Result<ApplicationSession> {
        let mut session = ApplicationSession::new(listing_id, self.max_steps);

        loop {
            session.step_count += 1;
            if session.step_count > session.max_steps {
                session.status = SessionStatus::Failed(FailureReason::StepLimitExceeded);
                break;
            }
            if let Some(reason) = self.cancel.reason() {
                session.status =
                    SessionStatus::Failed(FailureReason::Cancelled(reason.to_string()));
                break;
            }

            let questions = self.reader.read_current_screen()?;

            if !questions.is_empty() {
                if let Err(err) = self.resolve_and_fill(&questions, &mut session.stats) {
                    session.status = SessionStatus::Failed(to_failure(err));
                    break;
                }
            }

            // An error indicator outranks everything else; a form in
            // an error state must not be advanced.
            if self.navigator.has_error_indicator() {
                self.navigator.dismiss_and_discard();
                session.status = SessionStatus::Failed(FailureReason::FillError);
                break;
            }

            if self.navigator.has_submit_control() {
                session.status = if !submit {
                    SessionStatus::ReadyForSubmit
                } else if self.navigator.try_submit() {
                    SessionStatus::Submitted
                } else {
                    SessionStatus::Failed(FailureReason::StuckNoProgress)
                };
                break;
            }

            if !self.navigator.try_advance() {
                session.status = SessionStatus::Failed(FailureReason::StuckNoProgress);
                break;
            }
        }

        if let Some(record) = classify(&session) {
            self.storage.set_listing_status(&record)?;
        }

        Ok(session)
    }

    /// Resolve one screen's questions and push the answers in
    fn resolve_and_fill(
        &mut self,
        questions: &[FormQuestion],
        stats: &mut SessionStats,
    ) -> Result<()> {
        let labels: Vec<String> = questions.iter().map(|q| q.label.clone()).collect();
        let embeddings = self.embedder.embed_batch(&labels)?;

        let mut candidates: Vec<AnswerCandidate> = questions
            .iter()
            .zip(embeddings)
            .map(|(question, embedding)| AnswerCandidate::unresolved(&question.label, embedding))
            .collect();

        let historical = self.storage.all_historical_answers()?;
        stats.cache_hits += self.resolver.resolve(&mut candidates, &historical) as u32;

        let unresolved: Vec<FormQuestion> = questions
            .iter()
            .zip(&candidates)
            .filter(|(_, candidate)| !candidate.is_resolved())
            .map(|(question, _)| question.clone())
            .collect();

        if !unresolved.is_empty() {
            let generated = self.generator.generate_answers(&unresolved)?;
            for item in generated {
                let slot = candidates
                    .iter_mut()
                    .find(|c| c.provenance == Provenance::Unresolved && c.label == item.label);
                if let Some(candidate) = slot {
                    candidate.answer = Some(item.answer);
                    candidate.provenance = Provenance::Generated;
                    stats.generated += 1;
                }
            }
        }

        // Hand values to the filler; a miss on one field stays a
        // per-field outcome, never a step failure.
        let mut filled: Vec<usize> = Vec::new();
        for (idx, candidate) in candidates.iter().enumerate() {
            let Some(answer) = candidate.answer.as_deref() else {
                continue;
            };
            match self.filler.apply(&questions[idx], answer) {
                FillOutcome::Filled => filled.push(idx),
                FillOutcome::NotFound => {
                    stats.skipped += 1;
                    eprintln!("⚠️  Skipping '{}': control not found", questions[idx].label);
                }
                FillOutcome::Blocked => {
                    stats.skipped += 1;
                    eprintln!(
                        "⚠️  Skipping '{}': control refused interaction",
                        questions[idx].label
                    );
                }
            }
        }
        stats.filled += filled.len() as u32;

        self.persist_filled(questions, &candidates, &filled)
    }

    /// Append every filled field to the answer log
    fn persist_filled(
        &mut self,
        questions: &[FormQuestion],
        candidates: &[AnswerCandidate],
        filled: &[usize],
    ) -> Result<()> {
        if filled.is_empty() {
            return Ok(());
        }

        // Embeddings are recomputed from the current label text, not
        // re-used from the query.
        let labels: Vec<String> = filled
            .iter()
            .map(|&idx| questions[idx].label.clone())
            .collect();
        let fresh = self.embedder.embed_batch(&labels)?;

        for (&idx, embedding) in filled.iter().zip(fresh) {
            let Some(value) = candidates[idx].answer.as_deref() else {
                continue;
            };
            self.storage.append_historical_answer(&HistoricalAnswer::new(
                &questions[idx].label,
                value,
                questions[idx].kind.as_str(),
                embedding,
            ))?;
        }

        Ok(())
    }
}

/// Fold a step error into the failure vocabulary
fn to_failure(err: anyhow::Error) -> FailureReason {
    if is_cancellation(&err) {
        match err.downcast_ref::<Cancelled>() {
            Some(cancelled) => FailureReason::Cancelled(cancelled.reason.clone()),
            None => FailureReason::Cancelled(format!("{err:#}")),
        }
    } else {
        FailureReason::ResolutionFailed(format!("{err:#}"))
    }
}
