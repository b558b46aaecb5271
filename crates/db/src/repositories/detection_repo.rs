//! Repository for the `detected_objects` table.

use sqlx::{PgConnection, PgPool};

use custodia_core::types::DbId;

use crate::models::detection::{CreateDetectedObject, DetectedObject};

/// Column list for `detected_objects` queries.
const COLUMNS: &str = "\
    id, video_id, frame_number, timestamp_secs, object_class, confidence, \
    bbox_x, bbox_y, bbox_width, bbox_height, snapshot_url, created_at";

/// Number of bind parameters per inserted row.
const INSERT_PARAMS: u32 = 10;

/// Provides insert and query operations for object detections.
pub struct DetectionRepo;

impl DetectionRepo {
    /// Batch insert detections for one video.
    ///
    /// Uses a single multi-row INSERT; callers run it inside the batch
    /// transaction so a batch either fully commits or not at all.
    pub async fn insert_batch(
        conn: &mut PgConnection,
        video_id: DbId,
        rows: &[CreateDetectedObject],
    ) -> Result<(), sqlx::Error> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut query = String::from(
            "INSERT INTO detected_objects \
                 (video_id, frame_number, timestamp_secs, object_class, confidence, \
                  bbox_x, bbox_y, bbox_width, bbox_height, snapshot_url) \
             VALUES ",
        );
        let mut param_idx = 1u32;
        for (i, _) in rows.iter().enumerate() {
            if i > 0 {
                query.push_str(", ");
            }
            query.push('(');
            for p in 0..INSERT_PARAMS {
                if p > 0 {
                    query.push_str(", ");
                }
                query.push_str(&format!("${param_idx}"));
                param_idx += 1;
            }
            query.push(')');
        }

        let mut q = sqlx::query(&query);
        for row in rows {
            q = q
                .bind(video_id)
                .bind(row.frame_number)
                .bind(row.timestamp_secs)
                .bind(&row.object_class)
                .bind(row.confidence)
                .bind(row.bbox.x)
                .bind(row.bbox.y)
                .bind(row.bbox.width)
                .bind(row.bbox.height)
                .bind(&row.snapshot_url);
        }

        q.execute(conn).await?;
        Ok(())
    }

    /// List all detections for a video in frame order.
    pub async fn list_for_video(
        pool: &PgPool,
        video_id: DbId,
    ) -> Result<Vec<DetectedObject>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM detected_objects \
             WHERE video_id = $1 \
             ORDER BY frame_number ASC, id ASC"
        );
        sqlx::query_as::<_, DetectedObject>(&query)
            .bind(video_id)
            .fetch_all(pool)
            .await
    }

    /// Count detections for a video.
    pub async fn count_for_video(pool: &PgPool, video_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM detected_objects WHERE video_id = $1",
        )
        .bind(video_id)
        .fetch_one(pool)
        .await
    }
}
