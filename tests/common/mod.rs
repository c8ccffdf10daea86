//! Shared test doubles for the collaborator ports.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use cardroom::{
    GameNotification, InMemorySessionStore, Membership, Notifier, PlayerId, RoomManager,
    RoomRules, RuleStore, SeatedPlayer,
    game::RoomId,
    room::{MembershipError, NotifyError, RuleStoreError},
};

/// Fixed seat list; the engine re-derives the ring itself.
pub struct StaticMembership {
    pub seats: Vec<SeatedPlayer>,
}

#[async_trait]
impl Membership for StaticMembership {
    async fn seated_players(&self, _room: RoomId) -> Result<Vec<SeatedPlayer>, MembershipError> {
        Ok(self.seats.clone())
    }
}

/// Same rules for every room.
pub struct StaticRules(pub RoomRules);

#[async_trait]
impl RuleStore for StaticRules {
    async fn rules(&self, _room: RoomId) -> Result<RoomRules, RuleStoreError> {
        Ok(self.0.clone())
    }
}

/// Records every published event for assertions.
#[derive(Default)]
pub struct CollectingNotifier {
    pub events: Mutex<Vec<(RoomId, GameNotification)>>,
}

impl CollectingNotifier {
    pub async fn take(&self) -> Vec<(RoomId, GameNotification)> {
        std::mem::take(&mut *self.events.lock().await)
    }
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn publish(&self, room: RoomId, event: &GameNotification) -> Result<(), NotifyError> {
        self.events.lock().await.push((room, event.clone()));
        Ok(())
    }
}

/// Fails every delivery; committed state must be unaffected.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn publish(&self, _room: RoomId, _event: &GameNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("broadcaster offline".to_string()))
    }
}

pub type TestManager<N = CollectingNotifier> =
    RoomManager<InMemorySessionStore, StaticMembership, StaticRules, N>;

pub struct Harness<N: Notifier = CollectingNotifier> {
    pub manager: TestManager<N>,
    pub store: Arc<InMemorySessionStore>,
    pub notifier: Arc<N>,
}

/// Players 1..=n seated in id order.
pub fn seats(n: usize) -> Vec<SeatedPlayer> {
    (0..n)
        .map(|i| {
            SeatedPlayer::new(
                i as PlayerId + 1,
                Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
            )
        })
        .collect()
}

pub fn harness(seated: Vec<SeatedPlayer>, rules: RoomRules) -> Harness {
    harness_with(seated, rules, CollectingNotifier::default())
}

pub fn harness_with<N: Notifier>(seated: Vec<SeatedPlayer>, rules: RoomRules, notifier: N) -> Harness<N> {
    let store = Arc::new(InMemorySessionStore::new());
    let notifier = Arc::new(notifier);
    let manager = RoomManager::new(
        store.clone(),
        Arc::new(StaticMembership { seats: seated }),
        Arc::new(StaticRules(rules)),
        notifier.clone(),
    );
    Harness {
        manager,
        store,
        notifier,
    }
}
