//! Repository for the `face_observations` table.
//!
//! The `embedding` column uses pgvector's `vector(512)` type. Because we
//! use runtime queries (no compile-time sqlx macros), embeddings are passed
//! as text literals (e.g. `'[0.1, 0.2, ...]'::vector`) and cast in SQL.
//! Similarity queries use the cosine distance operator `<=>` backed by the
//! IVFFlat index.

use sqlx::{PgConnection, PgPool};

use custodia_core::types::DbId;

use crate::models::face::{AnnotateFace, CreateFaceObservation, FaceNeighbor, FaceObservation};

/// Column list for `face_observations` queries (excludes the vector column).
const COLUMNS: &str = "\
    id, video_id, frame_number, timestamp_secs, confidence, \
    bbox_x, bbox_y, bbox_width, bbox_height, embedding_valid, \
    age, gender, emotion, ethnicity, face_image_url, enhanced_face_url, \
    is_person_of_interest, poi_label, notes, created_at, updated_at";

/// Provides insert, similarity-search, and annotation operations.
pub struct FaceRepo;

impl FaceRepo {
    /// Batch insert face observations for one video.
    ///
    /// Each embedding is converted to a pgvector literal and cast in SQL.
    /// Callers run this inside the batch transaction.
    pub async fn insert_batch(
        conn: &mut PgConnection,
        video_id: DbId,
        rows: &[CreateFaceObservation],
    ) -> Result<(), sqlx::Error> {
        for row in rows {
            sqlx::query(
                "INSERT INTO face_observations \
                     (video_id, frame_number, timestamp_secs, confidence, \
                      bbox_x, bbox_y, bbox_width, bbox_height, \
                      embedding, embedding_valid, \
                      age, gender, emotion, ethnicity, \
                      face_image_url, enhanced_face_url) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::vector, $10, \
                         $11, $12, $13, $14, $15, $16)",
            )
            .bind(video_id)
            .bind(row.frame_number)
            .bind(row.timestamp_secs)
            .bind(row.confidence)
            .bind(row.bbox.x)
            .bind(row.bbox.y)
            .bind(row.bbox.width)
            .bind(row.bbox.height)
            .bind(format_vector_literal(&row.embedding))
            .bind(row.embedding_valid)
            .bind(row.age)
            .bind(&row.gender)
            .bind(&row.emotion)
            .bind(&row.ethnicity)
            .bind(&row.face_image_url)
            .bind(&row.enhanced_face_url)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Find an observation by ID (without its embedding).
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<FaceObservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM face_observations WHERE id = $1");
        sqlx::query_as::<_, FaceObservation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch an observation's embedding vector.
    pub async fn fetch_embedding(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Vec<f32>>, sqlx::Error> {
        let literal = sqlx::query_scalar::<_, String>(
            "SELECT embedding::text FROM face_observations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(literal.as_deref().map(parse_vector_literal))
    }

    /// Approximate nearest-neighbor search by cosine distance.
    ///
    /// Excludes the query's own observation and all invalid-sentinel
    /// embeddings, keeps neighbors within `max_distance`, orders ascending
    /// by distance, and returns at most `limit` rows. An empty store yields
    /// an empty vec.
    pub async fn find_similar(
        pool: &PgPool,
        query_embedding: &[f32],
        exclude_id: DbId,
        max_distance: f64,
        limit: i64,
    ) -> Result<Vec<FaceNeighbor>, sqlx::Error> {
        sqlx::query_as::<_, FaceNeighbor>(
            "SELECT id, video_id, frame_number, timestamp_secs, confidence, \
                    face_image_url, enhanced_face_url, \
                    (embedding <=> $1::vector)::DOUBLE PRECISION AS distance \
             FROM face_observations \
             WHERE id <> $2 \
               AND embedding_valid \
               AND (embedding <=> $1::vector) <= $3 \
             ORDER BY embedding <=> $1::vector ASC \
             LIMIT $4",
        )
        .bind(format_vector_literal(query_embedding))
        .bind(exclude_id)
        .bind(max_distance)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Apply an investigator annotation patch. Returns `false` when the
    /// observation does not exist.
    pub async fn annotate(
        pool: &PgPool,
        id: DbId,
        patch: &AnnotateFace,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE face_observations \
             SET is_person_of_interest = COALESCE($2, is_person_of_interest), \
                 poi_label = COALESCE($3, poi_label), \
                 notes = COALESCE($4, notes), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.is_person_of_interest)
        .bind(&patch.poi_label)
        .bind(&patch.notes)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count observations for a video.
    pub async fn count_for_video(pool: &PgPool, video_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM face_observations WHERE video_id = $1",
        )
        .bind(video_id)
        .fetch_one(pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// Vector literal helpers
// ---------------------------------------------------------------------------

/// Render an embedding as a pgvector text literal: `[0.1,0.2,...]`.
fn format_vector_literal(embedding: &[f32]) -> String {
    let mut literal = String::with_capacity(embedding.len() * 8 + 2);
    literal.push('[');
    for (i, v) in embedding.iter().enumerate() {
        if i > 0 {
            literal.push(',');
        }
        literal.push_str(&v.to_string());
    }
    literal.push(']');
    literal
}

/// Parse a pgvector text literal back into an `f32` vector.
///
/// Components that fail to parse become `0.0`; pgvector output never
/// produces such components in practice.
fn parse_vector_literal(literal: &str) -> Vec<f32> {
    literal
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.trim().parse::<f32>().unwrap_or(0.0))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_renders_bracketed_csv() {
        assert_eq!(format_vector_literal(&[0.5, -1.0, 2.0]), "[0.5,-1,2]");
    }

    #[test]
    fn format_of_empty_vector() {
        assert_eq!(format_vector_literal(&[]), "[]");
    }

    #[test]
    fn parse_reads_back_components() {
        assert_eq!(parse_vector_literal("[0.5,-1,2]"), vec![0.5, -1.0, 2.0]);
    }

    #[test]
    fn parse_tolerates_whitespace() {
        assert_eq!(parse_vector_literal("[0.5, -1.0, 2.0]"), vec![0.5, -1.0, 2.0]);
    }

    #[test]
    fn parse_of_empty_literal_is_empty() {
        assert!(parse_vector_literal("[]").is_empty());
    }

    #[test]
    fn roundtrip_preserves_values() {
        let original = vec![0.125f32, -3.5, 0.0, 42.0];
        let parsed = parse_vector_literal(&format_vector_literal(&original));
        assert_eq!(parsed, original);
    }
}
