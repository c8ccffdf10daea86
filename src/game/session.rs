//! The per-room session state machine.
//!
//! A `GameSession` owns the deck, discard pile, hands, and turn pointer for
//! one room. Every operation validates before the first write, mutates in
//! place, and returns the notifications to publish once the new state has
//! been committed. Shuffling is driven by a caller-supplied RNG so tests can
//! seed it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::constants::{DECK_SIZE, MIN_PLAYERS_TO_START};
use super::entities::{Card, Deck, GameStatus, ParseCardError, PlayerId, SeatedPlayer};
use super::events::GameNotification;

/// Errors surfaced by session operations.
#[derive(Clone, Debug, Deserialize, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("not seated in this room")]
    NotSeated,
    #[error("not your turn")]
    NotYourTurn,
    #[error("malformed card token: {0}")]
    MalformedCard(String),
    #[error("card {0} is not in your hand")]
    CardNotInHand(Card),
    #[error("card {0} doesn't match the top card by rank or suit")]
    InvalidPlay(Card),
    #[error("need at least 2 players, have {seated}")]
    InsufficientPlayers { seated: usize },
    #[error("room seats {seated} players but rules allow at most {max_players}")]
    TooManyPlayers { seated: usize, max_players: usize },
    #[error("dealing needs {needed} cards but the deck has {available}")]
    InsufficientCards { needed: usize, available: usize },
    #[error("game already in progress")]
    AlreadyInProgress,
    #[error("already picked up this turn")]
    AlreadyPickedUp,
    #[error("no game in progress")]
    NotInProgress,
    #[error("session not initialized for this room")]
    SessionNotInitialized,
    #[error("room is busy, retry")]
    Busy,
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("invalid session state")]
    Internal,
}

impl GameError {
    /// Whether the caller should re-read state and retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy | Self::Storage(_))
    }
}

impl From<ParseCardError> for GameError {
    fn from(value: ParseCardError) -> Self {
        Self::MalformedCard(value.0)
    }
}

/// Suit-or-rank legality: a card may be played on `top` when they share a
/// rank or a suit. An empty discard accepts any card.
#[must_use]
pub fn is_valid_play(card: Card, top: Option<Card>) -> bool {
    top.is_none_or(|t| t.rank == card.rank || t.suit == card.suit)
}

/// The fixed turn ring: seated players ordered by join time, ties broken by
/// id so the ring is deterministic.
#[must_use]
pub fn seating_ring(mut seated: Vec<SeatedPlayer>) -> Vec<SeatedPlayer> {
    seated.sort_by_key(|p| (p.joined_at, p.id));
    seated
}

/// The seat after `current`, wrapping around. If `current` is no longer in
/// the ring (the player left mid-game) rotation restarts at the first seat.
#[must_use]
pub fn next_in_ring(ring: &[SeatedPlayer], current: PlayerId) -> Option<PlayerId> {
    if ring.is_empty() {
        return None;
    }
    match ring.iter().position(|p| p.id == current) {
        Some(i) => Some(ring[(i + 1) % ring.len()].id),
        None => Some(ring[0].id),
    }
}

/// Read-only projection of a session for one player: their own hand plus
/// the sanitized room-wide counters. Served to reconnecting clients.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub hand: Vec<Card>,
    pub hand_counts: HashMap<PlayerId, usize>,
    pub deck_count: usize,
    pub discard_top: Option<Card>,
    pub current_turn: Option<PlayerId>,
    pub status: GameStatus,
}

/// Live game state for one room. Exactly one exists per room; it is only
/// ever reset, never destroyed, while the room exists.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSession {
    status: GameStatus,
    deck: Deck,
    /// The last element is the top card governing legal plays.
    discard: Vec<Card>,
    hands: HashMap<PlayerId, Vec<Card>>,
    current_turn: Option<PlayerId>,
    /// Set when a draw produced a playable card and kept the turn; cleared
    /// whenever the turn advances.
    has_picked_up_this_turn: bool,
    winner: Option<PlayerId>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// A waiting session with a fresh ordered deck. This is the state a
    /// room is bootstrapped with and the state `reset` restores.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: GameStatus::Waiting,
            deck: Deck::standard(),
            discard: Vec::new(),
            hands: HashMap::new(),
            current_turn: None,
            has_picked_up_this_turn: false,
            winner: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn discard(&self) -> &[Card] {
        &self.discard
    }

    #[must_use]
    pub fn discard_top(&self) -> Option<Card> {
        self.discard.last().copied()
    }

    #[must_use]
    pub fn hands(&self) -> &HashMap<PlayerId, Vec<Card>> {
        &self.hands
    }

    #[must_use]
    pub fn hand_counts(&self) -> HashMap<PlayerId, usize> {
        self.hands
            .iter()
            .map(|(id, hand)| (*id, hand.len()))
            .collect()
    }

    #[must_use]
    pub fn current_turn(&self) -> Option<PlayerId> {
        self.current_turn
    }

    #[must_use]
    pub fn has_picked_up_this_turn(&self) -> bool {
        self.has_picked_up_this_turn
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Start the game: shuffle a full deck, deal round-robin in seating
    /// order, flip the initial top card, and hand the turn to the first
    /// seat.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        seated: &[SeatedPlayer],
        cards_per_player: usize,
        rng: &mut R,
    ) -> Result<Vec<GameNotification>, GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::AlreadyInProgress);
        }
        let ring = seating_ring(seated.to_vec());
        if ring.len() < MIN_PLAYERS_TO_START {
            return Err(GameError::InsufficientPlayers { seated: ring.len() });
        }
        // The initial discard flip comes out of the same deal budget.
        let needed = ring.len() * cards_per_player + 1;
        if needed > DECK_SIZE {
            return Err(GameError::InsufficientCards {
                needed,
                available: DECK_SIZE,
            });
        }

        let mut deck = Deck::standard();
        deck.shuffle(rng);
        let mut hands: HashMap<PlayerId, Vec<Card>> = ring
            .iter()
            .map(|p| (p.id, Vec::with_capacity(cards_per_player)))
            .collect();
        for _ in 0..cards_per_player {
            for seat in &ring {
                if let Some(card) = deck.draw()
                    && let Some(hand) = hands.get_mut(&seat.id)
                {
                    hand.push(card);
                }
            }
        }
        let mut discard = Vec::new();
        if let Some(top) = deck.draw() {
            discard.push(top);
        }

        self.deck = deck;
        self.discard = discard;
        self.hands = hands;
        self.status = GameStatus::InProgress;
        self.current_turn = ring.first().map(|p| p.id);
        self.has_picked_up_this_turn = false;
        self.winner = None;

        let mut events = vec![GameNotification::SessionStarted {
            hand_counts: self.hand_counts(),
            discard_top: self.discard_top(),
            turn_player_id: self.current_turn,
            deck_count: self.deck.count(),
        }];
        for seat in &ring {
            if let Some(hand) = self.hands.get(&seat.id) {
                events.push(GameNotification::HandUpdated {
                    player_id: seat.id,
                    hand: hand.clone(),
                });
            }
        }
        Ok(events)
    }

    /// Play `card` onto the discard pile. Ends the game when it was the
    /// player's last card, otherwise advances the turn around the ring.
    pub fn play_card(
        &mut self,
        seated: &[SeatedPlayer],
        player: PlayerId,
        card: Card,
    ) -> Result<Vec<GameNotification>, GameError> {
        if self.status != GameStatus::InProgress {
            return Err(GameError::NotInProgress);
        }
        if self.current_turn != Some(player) {
            return Err(GameError::NotYourTurn);
        }
        let hand = self.hands.get(&player).ok_or(GameError::Internal)?;
        let idx = hand
            .iter()
            .position(|c| *c == card)
            .ok_or(GameError::CardNotInHand(card))?;
        if !is_valid_play(card, self.discard_top()) {
            return Err(GameError::InvalidPlay(card));
        }

        let hand = self.hands.get_mut(&player).ok_or(GameError::Internal)?;
        hand.remove(idx);
        let won = hand.is_empty();
        self.discard.push(card);

        if won {
            // Terminal: no rotation target once a hand is empty.
            self.status = GameStatus::Finished;
            self.winner = Some(player);
            self.current_turn = None;
            return Ok(vec![GameNotification::SessionFinished {
                winner_id: player,
                hand_counts: self.hand_counts(),
            }]);
        }

        let ring = seating_ring(seated.to_vec());
        self.current_turn = next_in_ring(&ring, player);
        self.has_picked_up_this_turn = false;

        let mut events = vec![GameNotification::CardPlayed {
            player_id: player,
            card: Some(card),
            discard_top: self.discard_top(),
            hand_counts: self.hand_counts(),
            deck_count: self.deck.count(),
            turn_player_id: self.current_turn,
        }];
        if let Some(hand) = self.hands.get(&player) {
            events.push(GameNotification::HandUpdated {
                player_id: player,
                hand: hand.clone(),
            });
        }
        Ok(events)
    }

    /// Draw into the player's hand. With `draw_until_match` the draw repeats
    /// until a drawn card would be legal on the current top or the deck and
    /// recyclable discard are exhausted. A draw ending with a playable card
    /// keeps the turn so that card can be played, and a repeat pickup in the
    /// same turn is rejected; a draw ending without one passes the turn, so
    /// an in-progress session always has a legal next move.
    pub fn pick_up_card<R: Rng + ?Sized>(
        &mut self,
        seated: &[SeatedPlayer],
        player: PlayerId,
        draw_until_match: bool,
        rng: &mut R,
    ) -> Result<Vec<GameNotification>, GameError> {
        if self.status != GameStatus::InProgress {
            return Err(GameError::NotInProgress);
        }
        if self.current_turn != Some(player) {
            return Err(GameError::NotYourTurn);
        }
        if self.has_picked_up_this_turn {
            return Err(GameError::AlreadyPickedUp);
        }
        if !self.hands.contains_key(&player) {
            return Err(GameError::Internal);
        }

        // The top card never changes while drawing; reshuffling keeps it.
        let top = self.discard_top();
        let mut last_drawn = None;
        loop {
            if self.deck.is_empty() {
                self.reshuffle_from_discard(rng);
            }
            let Some(card) = self.deck.draw() else {
                break;
            };
            if let Some(hand) = self.hands.get_mut(&player) {
                hand.push(card);
            }
            last_drawn = Some(card);
            if !draw_until_match || is_valid_play(card, top) {
                break;
            }
        }

        if last_drawn.is_some_and(|card| is_valid_play(card, top)) {
            self.has_picked_up_this_turn = true;
        } else {
            let ring = seating_ring(seated.to_vec());
            self.current_turn = next_in_ring(&ring, player);
            self.has_picked_up_this_turn = false;
        }

        let mut events = Vec::with_capacity(2);
        if let Some(hand) = self.hands.get(&player) {
            events.push(GameNotification::HandUpdated {
                player_id: player,
                hand: hand.clone(),
            });
        }
        events.push(GameNotification::CardPlayed {
            player_id: player,
            card: None,
            discard_top: self.discard_top(),
            hand_counts: self.hand_counts(),
            deck_count: self.deck.count(),
            turn_player_id: self.current_turn,
        });
        Ok(events)
    }

    /// Full wipe back to the bootstrap state. Legal from any status.
    pub fn reset(&mut self) -> Vec<GameNotification> {
        *self = Self::new();
        vec![GameNotification::SessionReset {}]
    }

    /// Projection for `player`; no mutation, no notification.
    #[must_use]
    pub fn snapshot(&self, player: PlayerId) -> StateSnapshot {
        StateSnapshot {
            hand: self.hands.get(&player).cloned().unwrap_or_default(),
            hand_counts: self.hand_counts(),
            deck_count: self.deck.count(),
            discard_top: self.discard_top(),
            current_turn: self.current_turn,
            status: self.status,
        }
    }

    /// Rebuild the draw pile from the discard pile, leaving only the top
    /// card behind. A single remaining card stays put and the deck stays
    /// empty.
    fn reshuffle_from_discard<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if !self.deck.is_empty() {
            return;
        }
        let Some(top) = self.discard.pop() else {
            return;
        };
        if self.discard.is_empty() {
            self.discard.push(top);
            return;
        }
        let mut deck = Deck::from_cards(std::mem::take(&mut self.discard));
        deck.shuffle(rng);
        self.deck = deck;
        self.discard.push(top);
    }
}
