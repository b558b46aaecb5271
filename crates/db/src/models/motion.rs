//! Motion summary entity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use custodia_core::types::{DbId, Timestamp};

/// A row from the `motion_summaries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MotionSummary {
    pub id: DbId,
    pub video_id: DbId,
    pub start_secs: f64,
    pub end_secs: f64,
    /// Fraction of pixels with significant accumulated motion, in [0, 1].
    pub movement_score: f64,
    pub hotspot_count: i32,
    /// Hotspot center coordinates and intensities.
    pub hotspots: serde_json::Value,
    pub heatmap_url: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting a motion summary.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMotionSummary {
    pub start_secs: f64,
    pub end_secs: f64,
    pub movement_score: f64,
    pub hotspot_count: i32,
    pub hotspots: serde_json::Value,
    pub heatmap_url: Option<String>,
}
