//! Face observation entity models and DTOs.
//!
//! The `embedding` column is pgvector `vector(512)` and is excluded from
//! `FromRow` structs; it is written and queried via text-literal casts in
//! raw SQL. `embedding_valid = false` marks the zero-vector failure
//! sentinel, which similarity queries filter out.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use custodia_core::detection::BoundingBox;
use custodia_core::types::{DbId, Timestamp};

/// A row from the `face_observations` table (without the embedding vector).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FaceObservation {
    pub id: DbId,
    pub video_id: DbId,
    pub frame_number: i64,
    pub timestamp_secs: f64,
    pub confidence: f64,
    pub bbox_x: i32,
    pub bbox_y: i32,
    pub bbox_width: i32,
    pub bbox_height: i32,
    pub embedding_valid: bool,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub emotion: Option<String>,
    pub ethnicity: Option<String>,
    pub face_image_url: Option<String>,
    pub enhanced_face_url: Option<String>,
    pub is_person_of_interest: bool,
    pub poi_label: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new face observation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFaceObservation {
    pub frame_number: i64,
    pub timestamp_secs: f64,
    pub confidence: f64,
    pub bbox: BoundingBox,
    /// Raw 512-dimensional embedding. Converted to a pgvector literal in SQL.
    pub embedding: Vec<f32>,
    pub embedding_valid: bool,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub emotion: Option<String>,
    pub ethnicity: Option<String>,
    pub face_image_url: Option<String>,
    pub enhanced_face_url: Option<String>,
}

/// A similarity-search hit: observation summary plus cosine distance.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FaceNeighbor {
    pub id: DbId,
    pub video_id: DbId,
    pub frame_number: i64,
    pub timestamp_secs: f64,
    pub confidence: f64,
    pub face_image_url: Option<String>,
    pub enhanced_face_url: Option<String>,
    pub distance: f64,
}

/// Investigator annotation patch; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotateFace {
    pub is_person_of_interest: Option<bool>,
    pub poi_label: Option<String>,
    pub notes: Option<String>,
}
