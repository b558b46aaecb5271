//! Chain-of-custody entity models.
//!
//! Rows in `custody_records` are append-only: the repository exposes no
//! update or delete operations and the chain for one video is ordered by
//! `(recorded_at, id)`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use custodia_core::types::{DbId, Timestamp};

/// A row from the `custody_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CustodyRecord {
    pub id: DbId,
    pub video_id: DbId,
    pub action: String,
    pub actor: String,
    pub hash_before: Option<String>,
    pub hash_after: Option<String>,
    pub details: serde_json::Value,
    pub recorded_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for appending a custody record.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustodyRecord {
    pub action: String,
    pub actor: String,
    pub hash_before: Option<String>,
    pub hash_after: Option<String>,
    pub details: serde_json::Value,
}
