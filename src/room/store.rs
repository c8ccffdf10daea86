//! Session state gateway.
//!
//! The engine's validate-and-apply logic never talks to storage directly; it
//! loads a versioned snapshot, mutates a copy, and commits it back with the
//! version it read. The trait is the seam for a durable backend; the shipped
//! implementation keeps everything in memory.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::game::{GameSession, RoomId};

/// Version used by `commit` to mean "insert only if absent".
pub const NO_VERSION: u64 = 0;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum StoreError {
    /// The session changed under the writer. Should not happen while all
    /// writers hold the room guard, but the gateway reports it rather than
    /// trusting callers.
    #[error("version conflict on room {room}: expected {expected}, found {found}")]
    VersionConflict {
        room: RoomId,
        expected: u64,
        found: u64,
    },
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// A committed session together with the version to pass back on commit.
#[derive(Clone, Debug, PartialEq)]
pub struct VersionedSession {
    pub version: u64,
    pub session: GameSession,
}

/// Load/commit gateway for per-room session state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Latest committed session for `room`, if one was ever created.
    async fn load(&self, room: RoomId) -> Result<Option<VersionedSession>, StoreError>;

    /// Compare-and-swap commit. `expected` must be the version returned by
    /// the preceding `load`, or [`NO_VERSION`] to create the row. Returns
    /// the new version.
    async fn commit(
        &self,
        room: RoomId,
        expected: u64,
        session: GameSession,
    ) -> Result<u64, StoreError>;
}

/// In-memory session store backed by a map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<RoomId, VersionedSession>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, room: RoomId) -> Result<Option<VersionedSession>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&room).cloned())
    }

    async fn commit(
        &self,
        room: RoomId,
        expected: u64,
        session: GameSession,
    ) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let found = sessions.get(&room).map_or(NO_VERSION, |v| v.version);
        if found != expected {
            return Err(StoreError::VersionConflict {
                room,
                expected,
                found,
            });
        }
        let version = expected + 1;
        sessions.insert(room, VersionedSession { version, session });
        Ok(version)
    }
}
