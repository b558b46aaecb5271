//! Detected-object entity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use custodia_core::detection::BoundingBox;
use custodia_core::types::{DbId, Timestamp};

/// A row from the `detected_objects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DetectedObject {
    pub id: DbId,
    pub video_id: DbId,
    pub frame_number: i64,
    pub timestamp_secs: f64,
    pub object_class: String,
    pub confidence: f64,
    pub bbox_x: i32,
    pub bbox_y: i32,
    pub bbox_width: i32,
    pub bbox_height: i32,
    pub snapshot_url: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting a detected object.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDetectedObject {
    pub frame_number: i64,
    pub timestamp_secs: f64,
    pub object_class: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
    pub snapshot_url: Option<String>,
}
