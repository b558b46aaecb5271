//! Background job entity models.
//!
//! Jobs carry at-least-once delivery semantics: the worker may claim the
//! same evidence twice after a crash, so the pipeline's status transition
//! is the idempotence guard, not the job row.

use serde::Serialize;
use sqlx::FromRow;

use custodia_core::types::{DbId, Timestamp};

use crate::models::status::StatusId;

/// Job type for the full evidence processing pipeline.
pub const JOB_TYPE_PROCESS_VIDEO: &str = "process_video";

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub job_type: String,
    pub status_id: StatusId,
    pub video_id: DbId,
    pub claimed_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub submitted_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
