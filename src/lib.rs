//! # Cardroom
//!
//! A room-based, turn-sequenced card game session engine.
//!
//! Each room owns exactly one [`GameSession`]: the deck, the discard pile,
//! every player's hand, and the turn pointer. Plays are legal when they
//! match the top of the discard pile by rank or suit; an exhausted draw
//! pile is rebuilt from the discard pile minus its top card; a player
//! emptying their hand ends the game.
//!
//! ## Architecture
//!
//! The session state machine is pure: operations validate, mutate in place,
//! and return the notifications to announce once the state is committed.
//! Everything around it is a port:
//!
//! - [`room::SessionStore`]: versioned load/commit gateway for session state
//! - [`room::Membership`]: who is seated in a room (authorization + turn ring)
//! - [`room::RuleStore`]: per-room house rules such as `draw_until_match`
//! - [`room::Notifier`]: outbound delivery of committed state deltas
//!
//! [`room::RoomManager`] wires the ports together and serializes all
//! mutations on a room behind a per-room guard with a bounded wait, so two
//! players racing the same turn resolve to exactly one success.
//!
//! ## Example
//!
//! ```
//! use cardroom::{GameSession, GameStatus};
//!
//! // A freshly bootstrapped room waits for a start.
//! let session = GameSession::new();
//! assert_eq!(session.status(), GameStatus::Waiting);
//! ```

/// Core game logic: cards, the session state machine, and its events.
pub mod game;
pub use game::{
    Card, GameError, GameNotification, GameSession, GameStatus, PlayerId, Rank, RoomId,
    SeatedPlayer, StateSnapshot, Suit, constants,
};

/// Room plumbing: collaborator ports, state gateway, operation surface.
pub mod room;
pub use room::{
    InMemorySessionStore, Membership, Notifier, NullNotifier, RoomManager, RoomRules, RuleStore,
    SessionStore,
};
