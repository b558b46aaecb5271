//! Evidence (video) entity models and DTOs.
//!
//! A video's identity is its SHA-256 content hash: the `sha256_hash`
//! column carries a UNIQUE constraint and is the deduplication key.
//! `last_committed_frame` records the highest frame number whose findings
//! have been transactionally committed; retries resume after it.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use custodia_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// A row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub filename: String,
    pub original_filename: String,
    pub storage_path: String,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<f64>,
    pub fps: Option<f64>,
    /// e.g. "1920x1080".
    pub resolution: Option<String>,
    pub codec: Option<String>,
    pub file_size_bytes: Option<i64>,
    pub status_id: StatusId,
    /// 0-100, monotonically non-decreasing.
    pub progress_percent: i16,
    pub sha256_hash: String,
    pub sha512_hash: Option<String>,
    /// Highest frame number committed by a batch flush; -1 when none.
    pub last_committed_frame: i64,
    pub analysis_results: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub uploaded_at: Timestamp,
    pub processed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering new evidence at upload time.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideo {
    pub filename: String,
    pub original_filename: String,
    pub storage_path: String,
    pub sha256_hash: String,
    pub sha512_hash: Option<String>,
}

/// Probed media metadata persisted early in a processing run.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub duration_secs: f64,
    pub fps: f64,
    pub resolution: String,
    pub codec: String,
    pub file_size_bytes: i64,
}

/// Aggregate counts written to `analysis_results` on completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub faces_detected: i64,
    pub objects_detected: i64,
    pub frames_analyzed: i64,
}
