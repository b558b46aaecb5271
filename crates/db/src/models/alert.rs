//! Alert entity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use custodia_core::types::{DbId, Timestamp};

/// A row from the `alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Alert {
    pub id: DbId,
    pub video_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub severity: String,
    pub alert_type: String,
    pub details: serde_json::Value,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// DTO for inserting an alert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlert {
    pub video_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub severity: String,
    pub alert_type: String,
    pub details: serde_json::Value,
}
