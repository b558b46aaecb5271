//! Event bus and alert notification infrastructure.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] — the canonical domain event envelope.
//! - [`AlertPersistence`] — background service that durably writes every
//!   alert-carrying event to the `alerts` table.
//!
//! Publishing is fire-and-forget: a full or subscriber-less channel never
//! blocks the pipeline.

pub mod alerts;
pub mod bus;

pub use alerts::AlertPersistence;
pub use bus::{EventBus, PlatformEvent};
