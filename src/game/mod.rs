//! Core game logic: card value types, the session state machine, and the
//! notifications it emits.

pub mod constants;
pub mod entities;
pub mod events;
pub mod session;

pub use entities::{Card, Deck, GameStatus, ParseCardError, PlayerId, Rank, RoomId, SeatedPlayer, Suit};
pub use events::{Audience, GameNotification};
pub use session::{GameError, GameSession, StateSnapshot, is_valid_play, next_in_ring, seating_ring};
