//! Membership collaborator port.
//!
//! Who is seated in a room is owned by an external service; the engine only
//! reads the seated list to check authorization and derive the turn ring.

use async_trait::async_trait;
use thiserror::Error;

use crate::game::{RoomId, SeatedPlayer};

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum MembershipError {
    #[error("room {0} does not exist")]
    UnknownRoom(RoomId),
    #[error("membership lookup failed: {0}")]
    Backend(String),
}

/// Read access to a room's seats.
#[async_trait]
pub trait Membership: Send + Sync {
    /// Players currently seated in `room`, with their join times. Order is
    /// not significant; the engine sorts into the seating ring itself.
    async fn seated_players(&self, room: RoomId) -> Result<Vec<SeatedPlayer>, MembershipError>;
}
