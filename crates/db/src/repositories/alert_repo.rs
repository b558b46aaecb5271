//! Repository for the `alerts` table.

use sqlx::PgPool;

use custodia_core::types::DbId;

use crate::models::alert::{Alert, CreateAlert};

/// Column list for `alerts` queries.
const COLUMNS: &str = "\
    id, video_id, title, description, severity, alert_type, \
    details, is_read, created_at";

/// Provides insert and query operations for alerts.
pub struct AlertRepo;

impl AlertRepo {
    /// Insert a new alert.
    pub async fn insert(pool: &PgPool, input: &CreateAlert) -> Result<Alert, sqlx::Error> {
        let query = format!(
            "INSERT INTO alerts \
                 (video_id, title, description, severity, alert_type, details) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(input.video_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.severity)
            .bind(&input.alert_type)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    /// List the most recent alerts, newest first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Alert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts ORDER BY created_at DESC LIMIT $1"
        );
        sqlx::query_as::<_, Alert>(&query)
            .bind(limit.clamp(1, 500))
            .fetch_all(pool)
            .await
    }

    /// Mark an alert as read. Returns `false` when it does not exist.
    pub async fn mark_read(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE alerts SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
