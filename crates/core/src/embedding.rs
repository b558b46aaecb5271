//! Facial embedding types, validation, and similarity math.
//!
//! Embeddings are fixed 512-dimensional vectors. A failed extraction is
//! represented by the zero-vector sentinel with `valid = false`, never a
//! partially-formed vector, so similarity search can filter it out
//! deterministically. Cosine distance over these vectors is bounded in
//! `[0, 2]` with 0 meaning identical direction.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Dimensionality of facial embeddings produced by the embedding model.
pub const EMBEDDING_DIMENSION: usize = 512;

/// Default maximum cosine distance for ranked similarity search.
pub const DEFAULT_MATCH_DISTANCE_THRESHOLD: f64 = 0.60;

/// Default cosine distance below which a pairwise comparison is considered
/// verified. Configured independently of the ranked-search threshold.
pub const DEFAULT_VERIFY_DISTANCE_THRESHOLD: f64 = 0.40;

/// Default maximum number of ranked matches returned by a search.
pub const DEFAULT_MAX_MATCHES: usize = 10;

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

/// A facial embedding paired with its extraction validity flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    /// `false` when extraction failed and `vector` is the zero sentinel.
    pub valid: bool,
}

impl Embedding {
    /// Wrap a successfully extracted vector.
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector, valid: true }
    }

    /// The designated failure sentinel: a zero vector flagged invalid.
    pub fn invalid() -> Self {
        Self {
            vector: vec![0.0; EMBEDDING_DIMENSION],
            valid: false,
        }
    }
}

/// Validate that an embedding vector has the correct dimensionality.
pub fn validate_embedding_dimension(embedding: &[f32]) -> Result<(), CoreError> {
    if embedding.len() != EMBEDDING_DIMENSION {
        return Err(CoreError::Validation(format!(
            "Embedding must be {EMBEDDING_DIMENSION}-dimensional, got {}",
            embedding.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Similarity math
// ---------------------------------------------------------------------------

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`. Returns `0.0` if vectors have different
/// lengths, are empty, or either has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Cosine distance in `[0.0, 2.0]`: `1 - cosine_similarity`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

/// Compare two embeddings for pairwise verification.
///
/// Returns `(distance, verified)` where `verified` holds when the distance
/// is at or below `verify_threshold`. An invalid embedding on either side
/// never verifies and reports the maximum-uncertainty distance of 1.0.
pub fn compare_embeddings(a: &Embedding, b: &Embedding, verify_threshold: f64) -> (f64, bool) {
    if !a.valid || !b.valid {
        return (1.0, false);
    }
    let distance = cosine_distance(&a.vector, &b.vector);
    (distance, distance <= verify_threshold)
}

// ---------------------------------------------------------------------------
// In-memory nearest-neighbor scan
// ---------------------------------------------------------------------------

/// A neighbor produced by [`find_nearest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: DbId,
    pub distance: f64,
}

/// Exhaustive nearest-neighbor scan over `(id, vector)` candidates.
///
/// Used where the candidate set is already in memory; the persisted store
/// answers the same query through its vector index. Excludes `query_id`
/// itself, drops candidates beyond `threshold`, orders ascending by
/// distance, and returns at most `max_results` entries. An empty candidate
/// set yields an empty result.
pub fn find_nearest(
    query_id: DbId,
    query: &[f32],
    candidates: &[(DbId, Vec<f32>)],
    threshold: f64,
    max_results: usize,
) -> Vec<Neighbor> {
    let mut neighbors: Vec<Neighbor> = candidates
        .iter()
        .filter(|(id, _)| *id != query_id)
        .map(|(id, vector)| Neighbor {
            id: *id,
            distance: cosine_distance(query, vector),
        })
        .filter(|n| n.distance <= threshold)
        .collect();

    neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    neighbors.truncate(max_results);
    neighbors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Embedding sentinel --------------------------------------------------

    #[test]
    fn invalid_embedding_is_zero_vector() {
        let e = Embedding::invalid();
        assert!(!e.valid);
        assert_eq!(e.vector.len(), EMBEDDING_DIMENSION);
        assert!(e.vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn validate_dimension_accepts_correct_size() {
        let v = vec![0.1f32; EMBEDDING_DIMENSION];
        assert!(validate_embedding_dimension(&v).is_ok());
    }

    #[test]
    fn validate_dimension_rejects_wrong_size() {
        let v = vec![0.1f32; 128];
        assert!(validate_embedding_dimension(&v).is_err());
    }

    // -- Cosine math ---------------------------------------------------------

    #[test]
    fn cosine_identical_vectors_returns_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_orthogonal_vectors_returns_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-9);
    }

    #[test]
    fn cosine_zero_magnitude_returns_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn distance_is_bounded_zero_to_two() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_distance(&a, &a) - 0.0).abs() < 1e-9);
        assert!((cosine_distance(&a, &b) - 2.0).abs() < 1e-9);
    }

    // -- compare_embeddings --------------------------------------------------

    #[test]
    fn identical_embeddings_verify_with_zero_distance() {
        let e = Embedding::new(vec![0.5, 0.5, 0.5]);
        let (distance, verified) =
            compare_embeddings(&e, &e, DEFAULT_VERIFY_DISTANCE_THRESHOLD);
        assert!(distance.abs() < 1e-9);
        assert!(verified);
    }

    #[test]
    fn unrelated_embeddings_do_not_verify() {
        let a = Embedding::new(vec![1.0, 0.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0, 0.0]);
        let (distance, verified) =
            compare_embeddings(&a, &b, DEFAULT_VERIFY_DISTANCE_THRESHOLD);
        assert!((distance - 1.0).abs() < 1e-9);
        assert!(!verified);
    }

    #[test]
    fn invalid_embedding_never_verifies() {
        let valid = Embedding::new(vec![1.0; EMBEDDING_DIMENSION]);
        let (distance, verified) = compare_embeddings(
            &valid,
            &Embedding::invalid(),
            DEFAULT_VERIFY_DISTANCE_THRESHOLD,
        );
        assert_eq!(distance, 1.0);
        assert!(!verified);
    }

    // -- find_nearest --------------------------------------------------------

    fn candidates() -> Vec<(DbId, Vec<f32>)> {
        vec![
            (1, vec![1.0, 0.0, 0.0]),
            (2, vec![0.9, 0.1, 0.0]),
            (3, vec![0.0, 1.0, 0.0]),
            (4, vec![0.0, 0.0, 1.0]),
        ]
    }

    #[test]
    fn empty_store_returns_empty_list() {
        let result = find_nearest(1, &[1.0, 0.0, 0.0], &[], 2.0, 10);
        assert!(result.is_empty());
    }

    #[test]
    fn query_observation_is_excluded() {
        let result = find_nearest(1, &[1.0, 0.0, 0.0], &candidates(), 2.0, 10);
        assert!(result.iter().all(|n| n.id != 1));
    }

    #[test]
    fn results_are_ordered_ascending_within_threshold() {
        let result = find_nearest(1, &[1.0, 0.0, 0.0], &candidates(), 2.0, 10);
        assert_eq!(result[0].id, 2);
        for pair in result.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn threshold_cuts_off_distant_candidates() {
        let result = find_nearest(1, &[1.0, 0.0, 0.0], &candidates(), 0.5, 10);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 2);
        assert!(result.iter().all(|n| n.distance <= 0.5));
    }

    #[test]
    fn max_results_bounds_the_list_after_cutoff() {
        let result = find_nearest(1, &[1.0, 0.0, 0.0], &candidates(), 2.0, 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 2);
    }
}
