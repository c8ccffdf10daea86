//! Per-room rule configuration and the port it is read through.
//!
//! Rule storage is an external collaborator; the engine only consumes the
//! values via [`RuleStore`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::RoomId;
use crate::game::constants::{
    DECK_SIZE, DEFAULT_CARDS_PER_PLAYER, DEFAULT_MAX_PLAYERS, MIN_PLAYERS_TO_START,
};

/// House rules and deal configuration for one room.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoomRules {
    /// Cards dealt to each seated player on start.
    pub cards_per_player: usize,

    /// When set, a pickup keeps drawing until the drawn card would be
    /// playable on the current top (or nothing is left to draw).
    pub draw_until_match: bool,

    /// Seats the room admits; starting a game with more seated players than
    /// this is rejected.
    pub max_players: usize,
}

impl Default for RoomRules {
    fn default() -> Self {
        Self {
            cards_per_player: DEFAULT_CARDS_PER_PLAYER,
            draw_until_match: false,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

impl RoomRules {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cards_per_player == 0 {
            return Err("cards per player must be at least 1".to_string());
        }

        if self.max_players < MIN_PLAYERS_TO_START || self.max_players > DEFAULT_MAX_PLAYERS {
            return Err(format!(
                "max players must be between {MIN_PLAYERS_TO_START} and {DEFAULT_MAX_PLAYERS}"
            ));
        }

        // A full table plus the initial flip must fit the deck.
        if self.max_players * self.cards_per_player + 1 > DECK_SIZE {
            return Err("a full table would exhaust the deck on the deal".to_string());
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RuleStoreError {
    #[error("rule lookup failed: {0}")]
    Backend(String),
}

/// Read access to a room's stored rules. Rooms with nothing stored get
/// [`RoomRules::default`].
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn rules(&self, room: RoomId) -> Result<RoomRules, RuleStoreError>;
}
