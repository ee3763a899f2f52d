//! Similarity metrics and matrix assembly for embeddings

use ndarray::{Array1, Array2, ArrayView2};

/// Replace non-finite components with 0.0 before any arithmetic
fn sanitize(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Stack variable-quality embedding rows into a dense matrix
///
/// Rows whose length differs from `dimension` are dropped instead of
/// padded. Returns the stacked matrix together with the original index
/// of each kept row, so callers can map matrix rows back to their
/// sparse inputs.
///
/// Non-finite components (NaN, infinities) are zeroed at ingestion.
pub fn stack_embeddings<R: AsRef<[f32]>>(rows: &[R], dimension: usize) -> (Array2<f64>, Vec<usize>) {
    let kept: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.as_ref().len() == dimension)
        .map(|(i, _)| i)
        .collect();

    let mut matrix = Array2::<f64>::zeros((kept.len(), dimension));
    for (out_row, &src) in kept.iter().enumerate() {
        for (j, &component) in rows[src].as_ref().iter().enumerate() {
            matrix[[out_row, j]] = sanitize(component as f64);
        }
    }

    (matrix, kept)
}

/// Compute the pairwise cosine similarity matrix between two stacks
///
/// Returns an `N x M` matrix where entry `(i, j)` is the cosine
/// similarity between `queries` row `i` and `corpus` row `j`:
/// - 1.0 = identical direction
/// - 0.0 = orthogonal (or either row has zero magnitude)
/// - -1.0 = opposite direction
///
/// All arithmetic runs in f64; results are clamped to [-1.0, 1.0]
/// before narrowing to f32, so float drift never leaks out of range.
/// Either stack may be empty, yielding an empty matrix.
///
/// # Panics
/// Panics if the two stacks disagree on dimension
pub fn cosine_similarity_matrix(queries: &ArrayView2<f64>, corpus: &ArrayView2<f64>) -> Array2<f32> {
    assert_eq!(
        queries.ncols(),
        corpus.ncols(),
        "Embedding stacks must have same dimension: {} vs {}",
        queries.ncols(),
        corpus.ncols()
    );

    let dots = queries.dot(&corpus.t());
    let query_norms: Array1<f64> = queries
        .rows()
        .into_iter()
        .map(|row| row.dot(&row).sqrt())
        .collect();
    let corpus_norms: Array1<f64> = corpus
        .rows()
        .into_iter()
        .map(|row| row.dot(&row).sqrt())
        .collect();

    let mut similarities = Array2::<f32>::zeros((queries.nrows(), corpus.nrows()));
    for i in 0..queries.nrows() {
        for j in 0..corpus.nrows() {
            let denominator = query_norms[i] * corpus_norms[j];
            let score = if denominator == 0.0 {
                0.0
            } else {
                (dots[[i, j]] / denominator).clamp(-1.0, 1.0)
            };
            similarities[[i, j]] = score as f32;
        }
    }

    similarities
}

/// Compute cosine similarity between two embedding vectors
///
/// Scalar path sharing the matrix semantics: non-finite components are
/// zeroed, zero-magnitude vectors score 0.0, and the result is clamped
/// to [-1.0, 1.0].
///
/// # Panics
/// Panics if vectors have different dimensions
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(
        a.len(),
        b.len(),
        "Vectors must have same dimension: {} vs {}",
        a.len(),
        b.len()
    );

    let mut dot_product = 0.0f64;
    let mut magnitude_a = 0.0f64;
    let mut magnitude_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = sanitize(x as f64);
        let y = sanitize(y as f64);
        dot_product += x * y;
        magnitude_a += x * x;
        magnitude_b += y * y;
    }
    let magnitude_a = magnitude_a.sqrt();
    let magnitude_b = magnitude_b.sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    (dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_relative_eq!(cosine_similarity(&a, &b), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert_relative_eq!(cosine_similarity(&a, &b), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        assert_relative_eq!(cosine_similarity(&a, &b), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_scale_invariant() {
        let a = vec![0.3, -1.2, 4.0, 0.07];
        let scaled: Vec<f32> = a.iter().map(|v| v * 250.0).collect();
        assert_relative_eq!(cosine_similarity(&a, &scaled), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_symmetric() {
        let a = vec![0.9, -0.2, 0.4];
        let b = vec![0.1, 0.8, -0.5];
        assert_relative_eq!(
            cosine_similarity(&a, &b),
            cosine_similarity(&b, &a),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_relative_eq!(cosine_similarity(&a, &b), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_nan_is_sanitized() {
        let a = vec![f32::NAN, 1.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let score = cosine_similarity(&a, &b);
        assert!(score.is_finite());
        assert_relative_eq!(score, 1.0, epsilon = 1e-6);
    }

    #[test]
    #[should_panic(expected = "Vectors must have same dimension")]
    fn test_cosine_similarity_different_dimensions() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        cosine_similarity(&a, &b);
    }

    #[test]
    fn test_stack_embeddings_drops_malformed_rows() {
        let rows = vec![
            vec![1.0, 0.0, 0.0],
            vec![1.0, 0.0],      // wrong dimension
            vec![0.0, 1.0, 0.0],
            vec![],              // empty
            vec![0.0, 0.0, 1.0],
        ];
        let (matrix, kept) = stack_embeddings(&rows, 3);
        assert_eq!(matrix.nrows(), 3);
        assert_eq!(matrix.ncols(), 3);
        assert_eq!(kept, vec![0, 2, 4]);
    }

    #[test]
    fn test_stack_embeddings_sanitizes_non_finite() {
        let rows = vec![vec![f32::NAN, f32::INFINITY, 1.0]];
        let (matrix, kept) = stack_embeddings(&rows, 3);
        assert_eq!(kept, vec![0]);
        assert_relative_eq!(matrix[[0, 0]], 0.0);
        assert_relative_eq!(matrix[[0, 1]], 0.0);
        assert_relative_eq!(matrix[[0, 2]], 1.0);
    }

    #[test]
    fn test_stack_embeddings_empty_input() {
        let rows: Vec<Vec<f32>> = Vec::new();
        let (matrix, kept) = stack_embeddings(&rows, 4);
        assert_eq!(matrix.nrows(), 0);
        assert_eq!(matrix.ncols(), 4);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_similarity_matrix_shape_and_values() {
        let queries = vec![vec![1.0, 0.0], vec![0.0, 2.0]];
        let corpus = vec![vec![3.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]];
        let (q, _) = stack_embeddings(&queries, 2);
        let (c, _) = stack_embeddings(&corpus, 2);
        let sim = cosine_similarity_matrix(&q.view(), &c.view());

        assert_eq!(sim.shape(), &[2, 3]);
        assert_relative_eq!(sim[[0, 0]], 1.0, epsilon = 1e-6);
        assert_relative_eq!(sim[[0, 1]], 0.0, epsilon = 1e-6);
        assert_relative_eq!(sim[[0, 2]], -1.0, epsilon = 1e-6);
        assert_relative_eq!(sim[[1, 1]], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_similarity_matrix_scale_invariance() {
        let base = vec![vec![0.5, -0.8, 0.1]];
        let scaled = vec![vec![50.0, -80.0, 10.0]];
        let (q, _) = stack_embeddings(&base, 3);
        let (c, _) = stack_embeddings(&scaled, 3);
        let sim = cosine_similarity_matrix(&q.view(), &c.view());
        assert_relative_eq!(sim[[0, 0]], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_similarity_matrix_zero_rows_score_zero() {
        let queries = vec![vec![0.0, 0.0, 0.0]];
        let corpus = vec![vec![1.0, 2.0, 3.0], vec![0.0, 0.0, 0.0]];
        let (q, _) = stack_embeddings(&queries, 3);
        let (c, _) = stack_embeddings(&corpus, 3);
        let sim = cosine_similarity_matrix(&q.view(), &c.view());
        assert_relative_eq!(sim[[0, 0]], 0.0, epsilon = 1e-6);
        assert_relative_eq!(sim[[0, 1]], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_similarity_matrix_stays_in_range() {
        // Components chosen so f32 arithmetic would drift past 1.0
        let queries = vec![vec![0.1000001, 0.1, 0.1, 0.1]];
        let corpus = vec![vec![0.1, 0.1000001, 0.1, 0.1]];
        let (q, _) = stack_embeddings(&queries, 4);
        let (c, _) = stack_embeddings(&corpus, 4);
        let sim = cosine_similarity_matrix(&q.view(), &c.view());
        assert!(sim[[0, 0]] <= 1.0);
        assert!(sim[[0, 0]] >= -1.0);
    }

    #[test]
    fn test_similarity_matrix_empty_sides() {
        let corpus = vec![vec![1.0, 0.0]];
        let none: Vec<Vec<f32>> = Vec::new();
        let (q, _) = stack_embeddings(&none, 2);
        let (c, _) = stack_embeddings(&corpus, 2);
        let sim = cosine_similarity_matrix(&q.view(), &c.view());
        assert_eq!(sim.shape(), &[0, 1]);
    }
}
