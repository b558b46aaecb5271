//! Durable alert persistence service.
//!
//! [`AlertPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and writes every `alert.*` event to the `alerts`
//! table. It runs as a long-lived background task so alert delivery never
//! blocks pipeline completion, and shuts down gracefully when the bus
//! sender is dropped.

use tokio::sync::broadcast;

use custodia_core::types::DbId;
use custodia_db::repositories::AlertRepo;
use custodia_db::DbPool;

use crate::bus::PlatformEvent;

/// Background service that persists alert events to the database.
pub struct AlertPersistence;

impl AlertPersistence {
    /// Run the persistence loop.
    ///
    /// Subscribes via the provided `receiver` and persists every alert
    /// event it receives. The loop exits when the channel is closed (i.e.
    /// the [`EventBus`](crate::bus::EventBus) is dropped).
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) if event.is_alert() => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist alert"
                        );
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Alert persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, alert persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write a single alert event to the `alerts` table.
    ///
    /// The alert type is the event name with the `alert.` prefix stripped;
    /// title, description, and severity come from the payload.
    async fn persist(pool: &DbPool, event: &PlatformEvent) -> Result<DbId, sqlx::Error> {
        let alert_type = event
            .event_type
            .strip_prefix(crate::bus::ALERT_EVENT_PREFIX)
            .unwrap_or(&event.event_type)
            .to_string();

        let title = event.payload["title"]
            .as_str()
            .unwrap_or(&event.event_type)
            .to_string();
        let description = event.payload["description"].as_str().map(String::from);
        let severity = event.payload["severity"]
            .as_str()
            .unwrap_or("medium")
            .to_string();
        let details = event
            .payload
            .get("details")
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));

        let alert = AlertRepo::insert(
            pool,
            &custodia_db::models::alert::CreateAlert {
                video_id: event.source_entity_id,
                title,
                description,
                severity,
                alert_type,
                details,
            },
        )
        .await?;
        Ok(alert.id)
    }
}
