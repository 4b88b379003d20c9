//! Cosine similarity and deterministic top-k ranking.

use std::cmp::Ordering;

use crate::vector::types::{Embedding, SimilarityMatch, VectorError};

/// Cosine similarity between two vectors of equal length.
///
/// Returns 0.0 when either vector has zero magnitude. The result is clamped
/// to [-1.0, 1.0] so rounding never reports an identical vector above 1.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, VectorError> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(cosine_unchecked(a, b))
}

/// Cosine similarity for callers that already validated dimensions.
///
/// Sums run in `f64`: squaring an `f32` component near 1e20 overflows `f32`,
/// and one near 1e-30 underflows it.
#[inline]
pub(crate) fn cosine_unchecked(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let mut dot = 0.0f64;
    let mut norm_a_sq = 0.0f64;
    let mut norm_b_sq = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a_sq += x * x;
        norm_b_sq += y * y;
    }
    finish_cosine(dot, norm_a_sq.sqrt(), norm_b_sq.sqrt())
}

/// Turns a dot product and two norms into a score in [-1.0, 1.0].
///
/// A zero norm scores 0.0.
#[inline]
pub(crate) fn finish_cosine(dot: f64, norm_a: f64, norm_b: f64) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32
    }
}

/// Rejects query vectors for which cosine similarity is undefined.
pub(crate) fn ensure_nonzero(query: &Embedding) -> Result<(), VectorError> {
    if query.norm() == 0.0 {
        return Err(VectorError::ZeroMagnitude);
    }
    Ok(())
}

/// A scored row before ranking. `seq` is the row's insertion position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
    pub seq: u64,
    pub key: String,
    pub score: f32,
}

/// Orders by score descending, then by insertion order ascending.
pub(crate) fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then(a.seq.cmp(&b.seq))
}

/// Sorts candidates and keeps the `top_k` best.
///
/// Deterministic for a fixed candidate set: equal scores keep insertion order.
pub(crate) fn rank_top_k(mut candidates: Vec<Candidate>, top_k: usize) -> Vec<SimilarityMatch> {
    candidates.sort_by(compare_candidates);
    candidates.truncate(top_k);
    candidates
        .into_iter()
        .map(|c| SimilarityMatch {
            key: c.key,
            score: c.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(seq: u64, key: &str, score: f32) -> Candidate {
        Candidate {
            seq,
            key: key.to_string(),
            score,
        }
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let a = [1.0, 2.0, 3.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
        assert!(sim <= 1.0);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-6);

        let sim = cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_extreme_magnitudes() {
        let huge = [1e20f32, 1e20];
        let sim = cosine_similarity(&huge, &huge).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);

        let sim = cosine_similarity(&huge, &[1.0, 1.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);

        let tiny = [1e-30f32, 0.0];
        let sim = cosine_similarity(&tiny, &[1.0, 0.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);

        let max = [f32::MAX, -f32::MAX];
        let sim = cosine_similarity(&max, &[1.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_tiny_query_is_not_zero_magnitude() {
        let tiny = Embedding::new(vec![1e-30, 0.0]).unwrap();
        assert!(ensure_nonzero(&tiny).is_ok());
    }

    #[test]
    fn test_cosine_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_dimension_mismatch_is_error() {
        assert_eq!(
            cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]),
            Err(VectorError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_zero_magnitude_query_rejected() {
        let zero = Embedding::new(vec![0.0, 0.0]).unwrap();
        assert_eq!(ensure_nonzero(&zero), Err(VectorError::ZeroMagnitude));
        let ok = Embedding::new(vec![0.0, 1.0]).unwrap();
        assert!(ensure_nonzero(&ok).is_ok());
    }

    #[test]
    fn test_rank_breaks_ties_by_insertion_order() {
        let ranked = rank_top_k(
            vec![
                candidate(2, "c", 0.5),
                candidate(0, "a", 0.5),
                candidate(1, "b", 0.9),
            ],
            3,
        );
        let keys: Vec<_> = ranked.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn test_rank_truncates() {
        let ranked = rank_top_k(
            vec![candidate(0, "a", 0.1), candidate(1, "b", 0.2)],
            1,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].key, "b");
    }

    #[test]
    fn test_negative_zero_ties_with_zero() {
        let ranked = rank_top_k(
            vec![candidate(0, "first", 0.0), candidate(1, "second", -0.0)],
            2,
        );
        assert_eq!(ranked[0].key, "first");
    }
}
