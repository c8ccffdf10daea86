//! Outbound notifications emitted by the session state machine.
//!
//! Events are produced by a successful transition and handed to the notifier
//! only after the transition has been committed. Room-wide events are
//! sanitized: they carry hand counts, never another player's hand contents.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::entities::{Card, PlayerId};

/// Who a notification is for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Audience {
    /// Everyone seated in the room.
    Room,
    /// Exactly one player; payload may contain their hand contents.
    Player(PlayerId),
}

/// A state delta announced after a committed transition.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameNotification {
    /// A game started; room-wide, hand contents withheld.
    SessionStarted {
        hand_counts: HashMap<PlayerId, usize>,
        discard_top: Option<Card>,
        turn_player_id: Option<PlayerId>,
        deck_count: usize,
    },
    /// A player's exact hand; private to that player.
    HandUpdated {
        player_id: PlayerId,
        hand: Vec<Card>,
    },
    /// A turn progressed; room-wide. `card` is `None` when the turn's
    /// action was a pickup rather than a play.
    CardPlayed {
        player_id: PlayerId,
        card: Option<Card>,
        discard_top: Option<Card>,
        hand_counts: HashMap<PlayerId, usize>,
        deck_count: usize,
        turn_player_id: Option<PlayerId>,
    },
    /// A player emptied their hand; room-wide, replaces `CardPlayed` for
    /// the winning play.
    SessionFinished {
        winner_id: PlayerId,
        hand_counts: HashMap<PlayerId, usize>,
    },
    /// The session was wiped back to waiting; room-wide, no payload.
    SessionReset {},
}

impl GameNotification {
    #[must_use]
    pub fn audience(&self) -> Audience {
        match self {
            Self::HandUpdated { player_id, .. } => Audience::Player(*player_id),
            _ => Audience::Room,
        }
    }
}
