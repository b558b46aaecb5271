//! Repository for the `custody_records` table.
//!
//! Append-only by construction: this repository exposes INSERT and SELECT
//! only. No UPDATE or DELETE statement exists for custody records anywhere
//! in the codebase.

use sqlx::PgPool;

use custodia_core::types::DbId;

use crate::models::custody::{CreateCustodyRecord, CustodyRecord};

/// Column list for `custody_records` queries.
const COLUMNS: &str = "\
    id, video_id, action, actor, hash_before, hash_after, \
    details, recorded_at, created_at";

/// Provides append and query operations for the custody chain.
pub struct CustodyRepo;

impl CustodyRepo {
    /// Append a custody record to a video's chain.
    pub async fn append(
        pool: &PgPool,
        video_id: DbId,
        input: &CreateCustodyRecord,
    ) -> Result<CustodyRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO custody_records \
                 (video_id, action, actor, hash_before, hash_after, details) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CustodyRecord>(&query)
            .bind(video_id)
            .bind(&input.action)
            .bind(&input.actor)
            .bind(&input.hash_before)
            .bind(&input.hash_after)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    /// List a video's full custody chain in append order.
    pub async fn list_for_video(
        pool: &PgPool,
        video_id: DbId,
    ) -> Result<Vec<CustodyRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM custody_records \
             WHERE video_id = $1 \
             ORDER BY recorded_at ASC, id ASC"
        );
        sqlx::query_as::<_, CustodyRecord>(&query)
            .bind(video_id)
            .fetch_all(pool)
            .await
    }

    /// The most recent record for a video, if any.
    pub async fn last_for_video(
        pool: &PgPool,
        video_id: DbId,
    ) -> Result<Option<CustodyRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM custody_records \
             WHERE video_id = $1 \
             ORDER BY recorded_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, CustodyRecord>(&query)
            .bind(video_id)
            .fetch_optional(pool)
            .await
    }
}
