//! Repository for the `motion_summaries` table.

use sqlx::PgPool;

use custodia_core::types::DbId;

use crate::models::motion::{CreateMotionSummary, MotionSummary};

/// Column list for `motion_summaries` queries.
const COLUMNS: &str = "\
    id, video_id, start_secs, end_secs, movement_score, \
    hotspot_count, hotspots, heatmap_url, created_at";

/// Provides insert and lookup operations for motion summaries.
pub struct MotionRepo;

impl MotionRepo {
    /// Insert a motion summary for a video window.
    pub async fn insert(
        pool: &PgPool,
        video_id: DbId,
        input: &CreateMotionSummary,
    ) -> Result<MotionSummary, sqlx::Error> {
        let query = format!(
            "INSERT INTO motion_summaries \
                 (video_id, start_secs, end_secs, movement_score, \
                  hotspot_count, hotspots, heatmap_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MotionSummary>(&query)
            .bind(video_id)
            .bind(input.start_secs)
            .bind(input.end_secs)
            .bind(input.movement_score)
            .bind(input.hotspot_count)
            .bind(&input.hotspots)
            .bind(&input.heatmap_url)
            .fetch_one(pool)
            .await
    }

    /// List motion summaries for a video ordered by window start.
    pub async fn list_for_video(
        pool: &PgPool,
        video_id: DbId,
    ) -> Result<Vec<MotionSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM motion_summaries \
             WHERE video_id = $1 \
             ORDER BY start_secs ASC"
        );
        sqlx::query_as::<_, MotionSummary>(&query)
            .bind(video_id)
            .fetch_all(pool)
            .await
    }
}
