//! Room manager: the serialized operation surface over per-room sessions.
//!
//! Every mutating operation acquires the room's guard for exactly the
//! read-modify-write and commit, never for outbound notification. A guard
//! that can't be acquired within [`GUARD_WAIT`](crate::game::constants::GUARD_WAIT)
//! surfaces as a retryable [`GameError::Busy`]; callers must re-read state
//! before retrying. `resync_state` bypasses the guard entirely and reads the
//! latest committed snapshot.

use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{Mutex, OwnedMutexGuard, RwLock},
    time::timeout,
};

use crate::game::{
    Card, GameError, GameNotification, GameSession, PlayerId, RoomId, StateSnapshot,
    constants::GUARD_WAIT,
};
use crate::room::{
    membership::{Membership, MembershipError},
    notify::Notifier,
    rules::{RuleStore, RuleStoreError},
    store::{NO_VERSION, SessionStore, StoreError},
};

impl From<StoreError> for GameError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<MembershipError> for GameError {
    fn from(value: MembershipError) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<RuleStoreError> for GameError {
    fn from(value: RuleStoreError) -> Self {
        Self::Storage(value.to_string())
    }
}

/// Serialized access to every room's session, injected with the three
/// collaborator ports and the state gateway.
pub struct RoomManager<S, M, R, N> {
    store: Arc<S>,
    membership: Arc<M>,
    rules: Arc<R>,
    notifier: Arc<N>,

    /// One guard per room; mutations on a room are at-most-one in flight.
    guards: RwLock<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl<S, M, R, N> RoomManager<S, M, R, N>
where
    S: SessionStore,
    M: Membership,
    R: RuleStore,
    N: Notifier,
{
    pub fn new(store: Arc<S>, membership: Arc<M>, rules: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            store,
            membership,
            rules,
            notifier,
            guards: RwLock::new(HashMap::new()),
        }
    }

    /// Exclusive access to one room, bounded wait.
    async fn guard(&self, room: RoomId) -> Result<OwnedMutexGuard<()>, GameError> {
        let existing = {
            let guards = self.guards.read().await;
            guards.get(&room).cloned()
        };
        let lock = match existing {
            Some(lock) => lock,
            None => {
                let mut guards = self.guards.write().await;
                guards
                    .entry(room)
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone()
            }
        };
        timeout(GUARD_WAIT, lock.lock_owned())
            .await
            .map_err(|_| GameError::Busy)
    }

    async fn load_required(&self, room: RoomId) -> Result<(u64, GameSession), GameError> {
        let versioned = self
            .store
            .load(room)
            .await?
            .ok_or(GameError::SessionNotInitialized)?;
        Ok((versioned.version, versioned.session))
    }

    /// Publish committed deltas; a dropped notification is recoverable via
    /// resync and never affects game state.
    async fn publish(&self, room: RoomId, events: &[GameNotification]) {
        for event in events {
            if let Err(e) = self.notifier.publish(room, event).await {
                log::warn!("room {room}: dropping committed notification: {e}");
            }
        }
    }

    /// Create the room's session if absent. Idempotent; safe under
    /// concurrent first access.
    pub async fn ensure_session(&self, room: RoomId) -> Result<(), GameError> {
        let _guard = self.guard(room).await?;
        if self.store.load(room).await?.is_none() {
            self.store
                .commit(room, NO_VERSION, GameSession::new())
                .await?;
            log::info!("room {room}: session created");
        }
        Ok(())
    }

    /// Shuffle, deal, and open play. The requester must be seated; the
    /// session is created lazily if this is the room's first access.
    pub async fn start_game(&self, room: RoomId, requester: PlayerId) -> Result<(), GameError> {
        let seated = self.membership.seated_players(room).await?;
        if !seated.iter().any(|p| p.id == requester) {
            return Err(GameError::NotSeated);
        }
        let rules = self.rules.rules(room).await?;
        if seated.len() > rules.max_players {
            return Err(GameError::TooManyPlayers {
                seated: seated.len(),
                max_players: rules.max_players,
            });
        }

        let events = {
            let _guard = self.guard(room).await?;
            let (version, mut session) = match self.store.load(room).await? {
                Some(v) => (v.version, v.session),
                None => (NO_VERSION, GameSession::new()),
            };
            let events = session.start(&seated, rules.cards_per_player, &mut rand::rng())?;
            self.store.commit(room, version, session).await?;
            log::info!("room {room}: game started by {requester}");
            events
        };
        self.publish(room, &events).await;
        Ok(())
    }

    /// Play a card given by its wire token.
    pub async fn play_card(
        &self,
        room: RoomId,
        player: PlayerId,
        card: &str,
    ) -> Result<(), GameError> {
        let card: Card = card.parse()?;
        let seated = self.membership.seated_players(room).await?;

        let events = {
            let _guard = self.guard(room).await?;
            let (version, mut session) = self.load_required(room).await?;
            let events = session.play_card(&seated, player, card)?;
            self.store.commit(room, version, session).await?;
            events
        };
        self.publish(room, &events).await;
        Ok(())
    }

    /// Draw under the room's house rules. A draw ending without a playable
    /// card passes the turn. Returns the drawer's refreshed view of the
    /// committed state.
    pub async fn pick_up_card(
        &self,
        room: RoomId,
        player: PlayerId,
    ) -> Result<StateSnapshot, GameError> {
        let seated = self.membership.seated_players(room).await?;
        let rules = self.rules.rules(room).await?;

        let (snapshot, events) = {
            let _guard = self.guard(room).await?;
            let (version, mut session) = self.load_required(room).await?;
            let events =
                session.pick_up_card(&seated, player, rules.draw_until_match, &mut rand::rng())?;
            self.store.commit(room, version, session.clone()).await?;
            (session.snapshot(player), events)
        };
        self.publish(room, &events).await;
        Ok(snapshot)
    }

    /// Wipe the session back to waiting. Membership is not consulted;
    /// gating who may reset is the caller's concern.
    pub async fn reset_game(&self, room: RoomId) -> Result<(), GameError> {
        let events = {
            let _guard = self.guard(room).await?;
            let (version, mut session) = self.load_required(room).await?;
            let events = session.reset();
            self.store.commit(room, version, session).await?;
            log::info!("room {room}: session reset");
            events
        };
        self.publish(room, &events).await;
        Ok(())
    }

    /// Latest committed snapshot for `player`. Never blocks on the guard;
    /// the result is advisory and may be stale by delivery time.
    pub async fn resync_state(
        &self,
        room: RoomId,
        player: PlayerId,
    ) -> Result<StateSnapshot, GameError> {
        let seated = self.membership.seated_players(room).await?;
        if !seated.iter().any(|p| p.id == player) {
            return Err(GameError::NotSeated);
        }
        let versioned = self
            .store
            .load(room)
            .await?
            .ok_or(GameError::SessionNotInitialized)?;
        Ok(versioned.session.snapshot(player))
    }
}
