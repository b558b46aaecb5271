//! Post-hoc facial similarity search over the accumulated embedding store.
//!
//! Queries run against the pgvector index by cosine distance. The ranking
//! threshold (maximum distance for a result) and the verification
//! threshold (pairwise match/no-match gate) are separate, independently
//! configured parameters.

use serde::Serialize;

use custodia_core::embedding::{compare_embeddings, Embedding};
use custodia_core::types::DbId;
use custodia_db::models::face::FaceNeighbor;
use custodia_db::repositories::FaceRepo;
use custodia_db::DbPool;

use crate::error::PipelineError;

/// A similarity match between two face observations.
///
/// Derived at query time, never stored during ingestion. `similarity` is
/// `1 - distance` for cosine distance in `[0, 2]`.
#[derive(Debug, Clone, Serialize)]
pub struct FaceMatch {
    pub query_face_id: DbId,
    pub matched_face_id: DbId,
    pub video_id: DbId,
    pub frame_number: i64,
    pub timestamp_secs: f64,
    pub distance: f64,
    pub similarity: f64,
    pub face_image_url: Option<String>,
    pub enhanced_face_url: Option<String>,
}

/// Nearest-neighbor queries and pairwise verification.
pub struct SimilaritySearch {
    pool: DbPool,
    match_distance_threshold: f64,
    verify_distance_threshold: f64,
    max_results: i64,
}

impl SimilaritySearch {
    pub fn new(
        pool: DbPool,
        match_distance_threshold: f64,
        verify_distance_threshold: f64,
        max_results: i64,
    ) -> Self {
        Self {
            pool,
            match_distance_threshold,
            verify_distance_threshold,
            max_results,
        }
    }

    /// Find the nearest neighbors of an existing observation's embedding.
    ///
    /// `threshold`/`max_results` override the configured defaults when
    /// given. The query's own observation is always excluded; results come
    /// back ordered by ascending distance, all within the threshold. An
    /// observation whose embedding is the invalid sentinel matches nothing.
    pub async fn find_similar(
        &self,
        face_id: DbId,
        threshold: Option<f64>,
        max_results: Option<i64>,
    ) -> Result<Vec<FaceMatch>, PipelineError> {
        let observation = FaceRepo::find_by_id(&self.pool, face_id)
            .await?
            .ok_or(PipelineError::FaceNotFound(face_id))?;
        if !observation.embedding_valid {
            return Ok(Vec::new());
        }

        let embedding = FaceRepo::fetch_embedding(&self.pool, face_id)
            .await?
            .ok_or(PipelineError::FaceNotFound(face_id))?;

        let neighbors = FaceRepo::find_similar(
            &self.pool,
            &embedding,
            face_id,
            threshold.unwrap_or(self.match_distance_threshold),
            max_results.unwrap_or(self.max_results),
        )
        .await?;

        Ok(neighbors
            .into_iter()
            .map(|n| to_match(face_id, n))
            .collect())
    }

    /// Pairwise verification of two observations.
    ///
    /// Returns `(distance, verified)` under the verification threshold.
    /// Comparing an observation against itself always yields distance 0
    /// and `verified = true` (when its embedding is valid).
    pub async fn compare(
        &self,
        face_a: DbId,
        face_b: DbId,
    ) -> Result<(f64, bool), PipelineError> {
        let a = self.load_embedding(face_a).await?;
        let b = self.load_embedding(face_b).await?;
        Ok(compare_embeddings(&a, &b, self.verify_distance_threshold))
    }

    async fn load_embedding(&self, face_id: DbId) -> Result<Embedding, PipelineError> {
        let observation = FaceRepo::find_by_id(&self.pool, face_id)
            .await?
            .ok_or(PipelineError::FaceNotFound(face_id))?;
        let vector = FaceRepo::fetch_embedding(&self.pool, face_id)
            .await?
            .ok_or(PipelineError::FaceNotFound(face_id))?;
        Ok(Embedding {
            vector,
            valid: observation.embedding_valid,
        })
    }
}

/// Map a store neighbor to the public match shape.
fn to_match(query_face_id: DbId, neighbor: FaceNeighbor) -> FaceMatch {
    FaceMatch {
        query_face_id,
        matched_face_id: neighbor.id,
        video_id: neighbor.video_id,
        frame_number: neighbor.frame_number,
        timestamp_secs: neighbor.timestamp_secs,
        distance: neighbor.distance,
        similarity: 1.0 - neighbor.distance,
        face_image_url: neighbor.face_image_url,
        enhanced_face_url: neighbor.enhanced_face_url,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_similarity_is_one_minus_distance() {
        let neighbor = FaceNeighbor {
            id: 9,
            video_id: 2,
            frame_number: 30,
            timestamp_secs: 1.0,
            confidence: 0.9,
            face_image_url: None,
            enhanced_face_url: None,
            distance: 0.25,
        };
        let m = to_match(4, neighbor);
        assert_eq!(m.query_face_id, 4);
        assert_eq!(m.matched_face_id, 9);
        assert!((m.similarity - 0.75).abs() < 1e-9);
    }
}
