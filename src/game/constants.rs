//! Game-wide constants.

use std::time::Duration;

/// Number of cards in a standard deck.
pub const DECK_SIZE: usize = 52;

/// Cards dealt to each player when a room has no stored rule for it.
pub const DEFAULT_CARDS_PER_PLAYER: usize = 6;

/// Minimum number of seated players required to start a game.
pub const MIN_PLAYERS_TO_START: usize = 2;

/// Largest table the engine will deal for.
pub const DEFAULT_MAX_PLAYERS: usize = 4;

/// Bounded wait for a room's exclusive guard. Operations that can't acquire
/// the guard within this window fail with a retryable error.
pub const GUARD_WAIT: Duration = Duration::from_millis(250);
