//! Outbound notifier port.
//!
//! The broadcaster behind this port (websocket fan-out, message bus, ...) is
//! external. The engine publishes only after a successful commit, and a
//! failed publish never rolls back game state: the committed session is the
//! source of truth and clients recover through a resync.

use async_trait::async_trait;
use thiserror::Error;

use crate::game::{GameNotification, RoomId};

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Delivery port for committed state deltas. Implementations route on
/// [`GameNotification::audience`].
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, room: RoomId, event: &GameNotification) -> Result<(), NotifyError>;
}

/// Notifier that drops everything. For rooms nobody is watching and for
/// tests that don't assert on delivery.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn publish(&self, _room: RoomId, _event: &GameNotification) -> Result<(), NotifyError> {
        Ok(())
    }
}
