//! Threshold-based resolution of candidates against the answer history

use super::{AnswerCandidate, HistoricalAnswer, Provenance};
use crate::embeddings::similarity::{cosine_similarity_matrix, stack_embeddings};

/// Explicit resolver configuration
///
/// Passed at construction so concurrent sessions can run with
/// different thresholds without ambient state. The threshold is
/// inclusive (`score >= threshold`); a lower bar risks silently
/// answering a different question with a stale value.
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    pub similarity_threshold: f32,
    pub dimension: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.95,
            dimension: 1024,
        }
    }
}

/// Matches unanswered candidates against historical answers by cosine
/// similarity
pub struct AnswerResolver {
    config: ResolverConfig,
}

impl AnswerResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Fill candidates in place from the best-matching historical rows
    ///
    /// For each candidate the single best-scoring historical answer is
    /// taken (ties broken by first occurrence, deterministic for a
    /// fixed history ordering). A candidate is only filled when that
    /// best score clears the threshold. Rows whose embeddings do not
    /// match the configured dimension sit out without failing the
    /// batch. Returns the number of candidates resolved from cache.
    pub fn resolve(
        &self,
        candidates: &mut [AnswerCandidate],
        historical: &[HistoricalAnswer],
    ) -> usize {
        if candidates.is_empty() || historical.is_empty() {
            return 0;
        }

        let query_rows: Vec<&[f32]> = candidates.iter().map(|c| c.embedding.as_slice()).collect();
        let corpus_rows: Vec<&[f32]> = historical.iter().map(|h| h.embedding.as_slice()).collect();

        let (queries, query_index) = stack_embeddings(&query_rows, self.config.dimension);
        let (corpus, corpus_index) = stack_embeddings(&corpus_rows, self.config.dimension);
        if queries.nrows() == 0 || corpus.nrows() == 0 {
            return 0;
        }

        let similarities = cosine_similarity_matrix(&queries.view(), &corpus.view());

        let mut resolved = 0;
        for (dense_row, &candidate_idx) in query_index.iter().enumerate() {
            let mut best_col = 0;
            let mut best_score = similarities[[dense_row, 0]];
            for col in 1..corpus.nrows() {
                let score = similarities[[dense_row, col]];
                if score > best_score {
                    best_score = score;
                    best_col = col;
                }
            }

            if best_score >= self.config.similarity_threshold {
                let source = &historical[corpus_index[best_col]];
                let candidate = &mut candidates[candidate_idx];
                candidate.answer = Some(source.value.clone());
                candidate.provenance = Provenance::Cache;
                resolved += 1;
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: f32, dimension: usize) -> ResolverConfig {
        ResolverConfig {
            similarity_threshold: threshold,
            dimension,
        }
    }

    fn historical(label: &str, value: &str, embedding: Vec<f32>) -> HistoricalAnswer {
        HistoricalAnswer::new(label, value, "text", embedding)
    }

    #[test]
    fn test_near_duplicate_resolves_from_cache() {
        // cosine against (1, 0) is exactly the first component of a unit vector
        let resolver = AnswerResolver::new(config(0.95, 2));
        let history = vec![historical("Years of experience", "5", vec![1.0, 0.0])];
        let mut candidates = vec![AnswerCandidate::unresolved(
            "Years of experience?",
            vec![0.97, 0.243_104_9],
        )];

        let resolved = resolver.resolve(&mut candidates, &history);

        assert_eq!(resolved, 1);
        assert_eq!(candidates[0].answer.as_deref(), Some("5"));
        assert_eq!(candidates[0].provenance, Provenance::Cache);
    }

    #[test]
    fn test_below_threshold_stays_unresolved() {
        let resolver = AnswerResolver::new(config(0.95, 2));
        let history = vec![historical("Years of experience", "5", vec![1.0, 0.0])];
        let mut candidates = vec![AnswerCandidate::unresolved(
            "Years of experience?",
            vec![0.8, 0.6],
        )];

        let resolved = resolver.resolve(&mut candidates, &history);

        assert_eq!(resolved, 0);
        assert_eq!(candidates[0].answer, None);
        assert_eq!(candidates[0].provenance, Provenance::Unresolved);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let resolver = AnswerResolver::new(config(1.0, 2));
        let history = vec![historical("City", "Lisbon", vec![0.6, 0.8])];
        let mut candidates = vec![AnswerCandidate::unresolved("City", vec![0.6, 0.8])];

        assert_eq!(resolver.resolve(&mut candidates, &history), 1);
        assert_eq!(candidates[0].answer.as_deref(), Some("Lisbon"));
    }

    #[test]
    fn test_raising_threshold_never_resolves_more() {
        let history = vec![
            historical("Years of experience", "5", vec![1.0, 0.0]),
            historical("Notice period", "30 days", vec![0.0, 1.0]),
        ];
        let make_candidates = || {
            vec![
                AnswerCandidate::unresolved("Years of experience?", vec![0.97, 0.243_104_9]),
                AnswerCandidate::unresolved("Notice period (days)", vec![0.6, 0.8]),
                AnswerCandidate::unresolved("Shoe size", vec![0.7, -0.714_142_8]),
            ]
        };

        let thresholds = [0.0, 0.5, 0.75, 0.95, 0.99, 1.0];
        let mut previous = usize::MAX;
        for threshold in thresholds {
            let resolver = AnswerResolver::new(config(threshold, 2));
            let mut candidates = make_candidates();
            let resolved = resolver.resolve(&mut candidates, &history);
            assert!(
                resolved <= previous,
                "threshold {threshold} resolved {resolved}, previous lower threshold resolved {previous}"
            );
            previous = resolved;
        }
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let resolver = AnswerResolver::new(config(0.9, 3));
        let history = vec![
            historical("Salary expectation", "90000", vec![0.2, 0.5, 0.9]),
            historical("Start date", "June", vec![0.9, 0.1, 0.0]),
        ];
        let mut first = vec![AnswerCandidate::unresolved(
            "Salary expectation",
            vec![0.2, 0.5, 0.9],
        )];
        let mut second = first.clone();

        resolver.resolve(&mut first, &history);
        resolver.resolve(&mut second, &history);
        // and a second pass over already-resolved candidates changes nothing
        let again = first.clone();
        resolver.resolve(&mut first, &history);

        assert_eq!(first[0].answer, second[0].answer);
        assert_eq!(first[0].answer, again[0].answer);
        assert_eq!(first[0].provenance, Provenance::Cache);
    }

    #[test]
    fn test_tie_broken_by_first_occurrence() {
        let resolver = AnswerResolver::new(config(0.9, 2));
        let history = vec![
            historical("Phone", "111-222", vec![1.0, 0.0]),
            historical("Phone number", "333-444", vec![1.0, 0.0]),
        ];
        let mut candidates = vec![AnswerCandidate::unresolved("Phone", vec![2.0, 0.0])];

        resolver.resolve(&mut candidates, &history);

        assert_eq!(candidates[0].answer.as_deref(), Some("111-222"));
    }

    #[test]
    fn test_empty_sides_are_no_ops() {
        let resolver = AnswerResolver::new(config(0.95, 2));

        let mut no_candidates: Vec<AnswerCandidate> = Vec::new();
        assert_eq!(
            resolver.resolve(&mut no_candidates, &[historical("A", "1", vec![1.0, 0.0])]),
            0
        );

        let mut candidates = vec![AnswerCandidate::unresolved("A", vec![1.0, 0.0])];
        assert_eq!(resolver.resolve(&mut candidates, &[]), 0);
        assert_eq!(candidates[0].provenance, Provenance::Unresolved);
    }

    #[test]
    fn test_foreign_dimension_rows_sit_out() {
        let resolver = AnswerResolver::new(config(0.9, 2));
        // first history row comes from an older deployment with a different model
        let history = vec![
            historical("Years of experience", "stale", vec![1.0, 0.0, 0.0, 0.0]),
            historical("Years of experience", "5", vec![1.0, 0.0]),
        ];
        let mut candidates = vec![
            AnswerCandidate::unresolved("Years of experience?", vec![1.0, 0.0]),
            AnswerCandidate::unresolved("malformed query", vec![1.0]),
        ];

        let resolved = resolver.resolve(&mut candidates, &history);

        assert_eq!(resolved, 1);
        assert_eq!(candidates[0].answer.as_deref(), Some("5"));
        assert_eq!(candidates[1].provenance, Provenance::Unresolved);
    }

    #[test]
    fn test_best_match_wins_not_first_above_threshold() {
        let resolver = AnswerResolver::new(config(0.5, 2));
        let history = vec![
            historical("Decent match", "decent", vec![0.8, 0.6]),
            historical("Exact match", "exact", vec![1.0, 0.0]),
        ];
        let mut candidates = vec![AnswerCandidate::unresolved("query", vec![1.0, 0.0])];

        resolver.resolve(&mut candidates, &history);

        assert_eq!(candidates[0].answer.as_deref(), Some("exact"));
    }
}
