//! Similarity computation for embeddings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors, or either vector is all zeros
/// - -1.0 means opposite vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    // Accumulate in f64: squaring f32 components underflows below ~1e-19
    // and overflows above ~1e19.
    let dot_product: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let magnitude_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let magnitude_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    // Rounding can push parallel vectors a hair past 1.0.
    Ok((dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0) as f32)
}

/// A similarity search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// ID of the matched item.
    pub id: String,

    /// Similarity score.
    pub score: f32,
}

impl SimilarityResult {
    /// Create a new similarity result.
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

/// Find the `k` candidates most similar to `query`, best first.
///
/// The sort is stable: candidates with equal scores keep the order in
/// which `candidates` yielded them.
pub fn find_top_k<'a, I>(query: &[f32], candidates: I, k: usize) -> Result<Vec<SimilarityResult>>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut scores: Vec<(OrderedFloat<f32>, &str)> = Vec::new();
    for (id, embedding) in candidates {
        let score = cosine_similarity(query, embedding)?;
        scores.push((OrderedFloat(score), id));
    }

    // Sort by score descending
    scores.sort_by(|a, b| b.0.cmp(&a.0));

    let results: Vec<SimilarityResult> = scores
        .into_iter()
        .take(k)
        .map(|(score, id)| SimilarityResult::new(id, score.0))
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidates(items: &[(&'static str, Vec<f32>)]) -> Vec<(String, Vec<f32>)> {
        items
            .iter()
            .map(|(id, v)| ((*id).to_string(), v.clone()))
            .collect()
    }

    fn borrowed(items: &[(String, Vec<f32>)]) -> impl Iterator<Item = (&str, &[f32])> {
        items.iter().map(|(id, v)| (id.as_str(), v.as_slice()))
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![0.3, -1.2, 4.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector_scores_zero() {
        let zero = vec![0.0, 0.0, 0.0];
        let b = vec![0.5, 0.2, -0.1];
        assert_eq!(cosine_similarity(&zero, &b).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&b, &zero).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_symmetric_and_bounded() {
        let vectors = [
            vec![1.0, 2.0, 3.0],
            vec![-4.0, 0.5, 2.0],
            vec![1e-3, 1e3, -7.0],
            vec![3.0, 6.0, 9.0],
            vec![0.0, 0.0, 0.0],
        ];
        for a in &vectors {
            for b in &vectors {
                let ab = cosine_similarity(a, b).unwrap();
                let ba = cosine_similarity(b, a).unwrap();
                assert_eq!(ab, ba);
                assert!((-1.0..=1.0).contains(&ab), "score {ab} out of range");
            }
        }
    }

    #[test]
    fn test_cosine_similarity_tiny_components() {
        let a = vec![1e-25, 2e-25, 0.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6, "self-similarity was {sim}");

        let b = vec![-2e-25, 1e-25, 0.0];
        assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_huge_components() {
        let a = vec![1e20, 2e20, 0.0];
        let sim = cosine_similarity(&a, &a).unwrap();
        assert!((sim - 1.0).abs() < 1e-6, "self-similarity was {sim}");

        let opposite = vec![-1e20, -2e20, 0.0];
        let sim = cosine_similarity(&a, &opposite).unwrap();
        assert!((sim + 1.0).abs() < 1e-6, "opposite similarity was {sim}");

        let mixed = vec![f32::MAX, 1.0, -f32::MAX];
        let sim = cosine_similarity(&mixed, &a).unwrap();
        assert!((-1.0..=1.0).contains(&sim), "score {sim} out of range");
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).is_err());
    }

    #[test]
    fn test_find_top_k() {
        let query = vec![1.0, 0.0, 0.0];
        let items = candidates(&[
            ("a", vec![1.0, 0.0, 0.0]), // similarity 1.0
            ("b", vec![0.0, 1.0, 0.0]), // similarity 0.0
            ("c", vec![0.7, 0.7, 0.0]), // similarity ~0.7
        ]);

        let results = find_top_k(&query, borrowed(&items), 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "c");
    }

    #[test]
    fn test_find_top_k_keeps_candidate_order_for_ties() {
        let query = vec![1.0, 0.0];
        let items = candidates(&[
            ("first", vec![2.0, 0.0]),
            ("second", vec![5.0, 0.0]),
            ("third", vec![0.0, 1.0]),
        ]);

        let results = find_top_k(&query, borrowed(&items), 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_find_top_k_empty_and_zero_limit() {
        let query = vec![1.0, 0.0];
        let empty: Vec<(String, Vec<f32>)> = Vec::new();
        assert!(find_top_k(&query, borrowed(&empty), 5).unwrap().is_empty());

        let items = candidates(&[("a", vec![1.0, 0.0])]);
        assert!(find_top_k(&query, borrowed(&items), 0).unwrap().is_empty());
    }
}
