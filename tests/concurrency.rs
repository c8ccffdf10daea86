//! Per-room serialization under contention: racing mutations resolve to a
//! single winner, bootstrap is create-once, and a slow commit turns the
//! second caller away with a retryable error instead of blocking it.

mod common;

use async_trait::async_trait;
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc, time::Duration};

use common::{CollectingNotifier, StaticMembership, StaticRules, seats};
use cardroom::{
    Card, GameError, GameSession, InMemorySessionStore, RoomManager, RoomRules,
    game::RoomId,
    room::{NO_VERSION, SessionStore, StoreError, VersionedSession},
};

const ROOM: i64 = 11;

/// Player 1 to move with two playable cards against top 7-♥.
fn crafted() -> GameSession {
    serde_json::from_value(json!({
        "status": "in_progress",
        "deck": { "cards": ["4-♦", "J-♣", "7-♦"] },
        "discard": ["7-♥"],
        "hands": { "1": ["7-♣", "K-♥"], "2": ["9-♠", "9-♦"] },
        "current_turn": 1,
        "has_picked_up_this_turn": false,
        "winner": null
    }))
    .unwrap()
}

fn card_multiset(session: &GameSession) -> BTreeMap<Card, usize> {
    let mut counts = BTreeMap::new();
    for card in session.deck().iter() {
        *counts.entry(*card).or_insert(0) += 1;
    }
    for card in session.discard() {
        *counts.entry(*card).or_insert(0) += 1;
    }
    for hand in session.hands().values() {
        for card in hand {
            *counts.entry(*card).or_insert(0) += 1;
        }
    }
    counts
}

/// Store whose commits take longer than the guard wait, to force the
/// bounded-wait path.
struct SlowStore {
    inner: InMemorySessionStore,
    commit_delay: Duration,
}

#[async_trait]
impl SessionStore for SlowStore {
    async fn load(&self, room: RoomId) -> Result<Option<VersionedSession>, StoreError> {
        self.inner.load(room).await
    }

    async fn commit(
        &self,
        room: RoomId,
        expected: u64,
        session: GameSession,
    ) -> Result<u64, StoreError> {
        tokio::time::sleep(self.commit_delay).await;
        self.inner.commit(room, expected, session).await
    }
}

fn manager_over<S: SessionStore>(
    store: Arc<S>,
    seated: usize,
    rules: RoomRules,
) -> Arc<RoomManager<S, StaticMembership, StaticRules, CollectingNotifier>> {
    Arc::new(RoomManager::new(
        store,
        Arc::new(StaticMembership { seats: seats(seated) }),
        Arc::new(StaticRules(rules)),
        Arc::new(CollectingNotifier::default()),
    ))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_racing_plays_resolve_to_one_winner() {
    let store = Arc::new(InMemorySessionStore::new());
    store.commit(ROOM, NO_VERSION, crafted()).await.unwrap();
    let manager = manager_over(store.clone(), 2, RoomRules::default());

    let a = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.play_card(ROOM, 1, "7-♣").await })
    };
    let b = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.play_card(ROOM, 1, "K-♥").await })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    // Exactly one play lands; the loser observes the advanced turn.
    assert_eq!(a.is_ok() as usize + b.is_ok() as usize, 1);
    let loser = if a.is_ok() { b } else { a };
    assert_eq!(loser.unwrap_err(), GameError::NotYourTurn);

    let stored = store.load(ROOM).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.session.hands()[&1].len(), 1);
    assert_eq!(stored.session.current_turn(), Some(2));
    assert_eq!(card_multiset(&stored.session), card_multiset(&crafted()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_bootstrap_creates_once() {
    let store = Arc::new(InMemorySessionStore::new());
    let manager = manager_over(store.clone(), 2, RoomRules::default());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.ensure_session(ROOM).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.load(ROOM).await.unwrap().unwrap().version, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_play_and_pickup_race_stays_consistent() {
    let store = Arc::new(InMemorySessionStore::new());
    store.commit(ROOM, NO_VERSION, crafted()).await.unwrap();
    let manager = manager_over(store.clone(), 2, RoomRules::default());

    let play = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.play_card(ROOM, 1, "K-♥").await })
    };
    let pickup = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.pick_up_card(ROOM, 1).await })
    };
    let (play, pickup) = (play.await.unwrap(), pickup.await.unwrap());

    // Either action resolves player 1's turn: the play rotates it and the
    // unplayable 4-♦ draw passes it. Exactly one lands.
    match (play, pickup) {
        (Ok(()), Err(e)) => assert_eq!(e, GameError::NotYourTurn),
        (Err(e), Ok(_)) => assert_eq!(e, GameError::NotYourTurn),
        (play, pickup) => panic!("expected one winner, got {play:?} and {pickup:?}"),
    }

    let session = store.load(ROOM).await.unwrap().unwrap().session;
    assert_eq!(session.current_turn(), Some(2));
    assert_eq!(card_multiset(&session), card_multiset(&crafted()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_commit_turns_second_caller_away_busy() {
    let store = Arc::new(SlowStore {
        inner: InMemorySessionStore::new(),
        commit_delay: Duration::from_millis(400),
    });
    store.commit(ROOM, NO_VERSION, crafted()).await.unwrap();
    let manager = manager_over(store.clone(), 2, RoomRules::default());

    let a = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.play_card(ROOM, 1, "7-♣").await })
    };
    let b = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.play_card(ROOM, 1, "K-♥").await })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    assert_eq!(a.is_ok() as usize + b.is_ok() as usize, 1);
    let loser = if a.is_ok() { b } else { a }.unwrap_err();
    assert_eq!(loser, GameError::Busy);
    assert!(loser.is_transient());

    let stored = store.load(ROOM).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_guards_are_per_room() {
    let store = Arc::new(SlowStore {
        inner: InMemorySessionStore::new(),
        commit_delay: Duration::from_millis(400),
    });
    let manager = manager_over(store, 2, RoomRules::default());

    // A slow commit in one room must not starve another room's guard.
    let a = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.start_game(21, 1).await })
    };
    let b = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.start_game(22, 2).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();
}
