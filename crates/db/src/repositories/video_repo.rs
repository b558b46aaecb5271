//! Repository for the `videos` table.
//!
//! Status transitions use `VideoStatus` enum constants; no magic numbers.
//! Progress updates go through `GREATEST` so the stored percentage can
//! never regress regardless of caller ordering.

use sqlx::{PgConnection, PgPool};

use custodia_core::types::DbId;

use crate::models::status::{StatusId, VideoStatus};
use crate::models::video::{AnalysisResults, CreateVideo, Video, VideoMetadata};

/// Column list for `videos` queries.
const COLUMNS: &str = "\
    id, filename, original_filename, storage_path, thumbnail_url, \
    duration_secs, fps, resolution, codec, file_size_bytes, \
    status_id, progress_percent, sha256_hash, sha512_hash, \
    last_committed_frame, analysis_results, error_message, \
    uploaded_at, processed_at, created_at, updated_at";

/// Provides CRUD and lifecycle operations for evidence videos.
pub struct VideoRepo;

impl VideoRepo {
    /// Register newly uploaded evidence in the `Uploaded` state.
    ///
    /// The UNIQUE constraint on `sha256_hash` rejects re-uploads of
    /// identical bytes before any processing work begins.
    pub async fn create(pool: &PgPool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos \
                 (filename, original_filename, storage_path, sha256_hash, sha512_hash, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(&input.filename)
            .bind(&input.original_filename)
            .bind(&input.storage_path)
            .bind(&input.sha256_hash)
            .bind(&input.sha512_hash)
            .bind(VideoStatus::Uploaded.id())
            .fetch_one(pool)
            .await
    }

    /// Find a video by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up evidence by content hash (the deduplication check).
    pub async fn find_by_hash(pool: &PgPool, sha256: &str) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE sha256_hash = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(sha256)
            .fetch_optional(pool)
            .await
    }

    /// Atomically enter the `Processing` state.
    ///
    /// Valid only from `Uploaded` (first attempt) or `Failed` (retry).
    /// Returns `false` when the transition did not apply, which makes
    /// redelivered jobs no-ops.
    pub async fn begin_processing(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos \
             SET status_id = $2, error_message = NULL, updated_at = NOW() \
             WHERE id = $1 AND status_id IN ($3, $4)",
        )
        .bind(id)
        .bind(VideoStatus::Processing.id())
        .bind(VideoStatus::Uploaded.id())
        .bind(VideoStatus::Failed.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Persist probed media metadata.
    pub async fn update_metadata(
        pool: &PgPool,
        id: DbId,
        metadata: &VideoMetadata,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE videos \
             SET duration_secs = $2, fps = $3, resolution = $4, codec = $5, \
                 file_size_bytes = $6, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(metadata.duration_secs)
        .bind(metadata.fps)
        .bind(&metadata.resolution)
        .bind(&metadata.codec)
        .bind(metadata.file_size_bytes)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Store the thumbnail URL.
    pub async fn set_thumbnail(pool: &PgPool, id: DbId, url: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE videos SET thumbnail_url = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(url)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Report progress. `GREATEST` keeps the stored value monotonically
    /// non-decreasing as observed by any external reader.
    pub async fn update_progress(pool: &PgPool, id: DbId, percent: i16) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE videos \
             SET progress_percent = GREATEST(progress_percent, $2), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(percent.clamp(0, 100))
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Advance the crash-recovery checkpoint inside a batch transaction.
    ///
    /// `frame_number` is the highest frame whose findings are part of the
    /// same transaction; committing the batch and the checkpoint together
    /// is what makes a batch boundary a recovery point.
    pub async fn advance_checkpoint(
        conn: &mut PgConnection,
        id: DbId,
        frame_number: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE videos \
             SET last_committed_frame = GREATEST(last_committed_frame, $2), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(frame_number)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Finalize a successful run: aggregate counts, progress 100, terminal
    /// `Completed` state.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        results: &AnalysisResults,
    ) -> Result<(), sqlx::Error> {
        let results = serde_json::to_value(results)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query(
            "UPDATE videos \
             SET status_id = $2, progress_percent = 100, analysis_results = $3, \
                 processed_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(VideoStatus::Completed.id())
        .bind(results)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Transition to the terminal `Failed` state with an error description.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE videos \
             SET status_id = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(VideoStatus::Failed.id())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count videos in a given status.
    pub async fn count_by_status(pool: &PgPool, status: StatusId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM videos WHERE status_id = $1",
        )
        .bind(status)
        .fetch_one(pool)
        .await
    }
}
