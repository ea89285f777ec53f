//! Round-progression state machine.
//!
//! [`SessionState`] is a plain value holding everything the presentation
//! layer needs to render one session. The session controller owns the only
//! mutable copy and publishes clones after every transition — no ambient
//! shared state. All methods here are pure transitions: timers and network
//! I/O live in [`crate::session`].
//!
//! Phases: `Idle -> Drawing -> Countdown -> Revealing -> Scored ->
//! (Drawing | Done)`, with `Faulted` entered when the deck service fails so
//! the frontend can offer a retry instead of hanging in a loading state.

use serde::{Deserialize, Serialize};

use crate::cards::{Card, RoundOutcome, RoundResult};

/// Rounds in one full session.
pub const ROUNDS_PER_SESSION: u32 = 10;

/// Countdown display counter start value.
pub const COUNTDOWN_START: u8 = 5;

/// Display label for the simulated opponent.
pub const OPPONENT_NAME: &str = "PC";

/// Where the session currently is in the round sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No cards held; session start or between rounds.
    Idle,
    /// Waiting on the deck service for two cards.
    Drawing,
    /// Visible counter running from 5 to 0; purely presentational.
    Countdown,
    /// Cards face-up; comparison happens when the display delay elapses.
    Revealing,
    /// Round decided and tallied.
    Scored,
    /// Terminal: ten rounds played, winner computed.
    Done,
    /// The deck service failed; awaiting retry or teardown.
    Faulted,
}

/// Snapshot of one session, pushed to the presentation layer after every
/// transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub player_name: String,
    /// Side flag: computed once from the location provider, threaded
    /// through unchanged for the whole session.
    pub player_on_left: bool,
    pub player_score: u32,
    pub opponent_score: u32,
    pub ties: u32,
    pub rounds_completed: u32,
    pub phase: Phase,
    /// Current countdown digit (only meaningful in [`Phase::Countdown`]).
    pub countdown: u8,
    /// Whether card faces are visible.
    pub cards_revealed: bool,
    pub player_card: Option<Card>,
    pub opponent_card: Option<Card>,
    /// Every decided round, in order.
    pub history: Vec<RoundResult>,
    /// Set exactly once, when the phase reaches [`Phase::Done`].
    pub winner: Option<String>,
    /// Last deck failure, for display in [`Phase::Faulted`].
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn new(player_name: &str, player_on_left: bool) -> Self {
        Self {
            player_name: player_name.to_string(),
            player_on_left,
            player_score: 0,
            opponent_score: 0,
            ties: 0,
            rounds_completed: 0,
            phase: Phase::Idle,
            countdown: COUNTDOWN_START,
            cards_revealed: false,
            player_card: None,
            opponent_card: None,
            history: Vec::new(),
            winner: None,
            last_error: None,
        }
    }

    /// Enter [`Phase::Drawing`]: cards go face-down and are discarded.
    pub fn begin_drawing(&mut self) {
        self.player_card = None;
        self.opponent_card = None;
        self.cards_revealed = false;
        self.last_error = None;
        self.phase = Phase::Drawing;
        tracing::debug!(round = self.rounds_completed + 1, "drawing");
    }

    /// A successful draw: the first card is the player's, the second the
    /// opponent's (order fixed by the deck service's response order).
    /// Enters [`Phase::Countdown`] with the counter reset.
    pub fn cards_drawn(&mut self, player: Card, opponent: Card) {
        self.player_card = Some(player);
        self.opponent_card = Some(opponent);
        self.countdown = COUNTDOWN_START;
        self.phase = Phase::Countdown;
    }

    /// Decrement the countdown digit, returning the new value.
    pub fn tick(&mut self) -> u8 {
        self.countdown = self.countdown.saturating_sub(1);
        self.countdown
    }

    /// Cards become visible.
    pub fn reveal(&mut self) {
        self.cards_revealed = true;
        self.phase = Phase::Revealing;
    }

    /// Compare the held cards, tally the outcome, and complete the round.
    ///
    /// Exactly one of `player_score`, `opponent_score`, `ties` increments;
    /// `rounds_completed` always does.
    pub fn score(&mut self) {
        let (Some(player), Some(opponent)) = (self.player_card.clone(), self.opponent_card.clone())
        else {
            tracing::warn!("score() without two held cards; round not counted");
            return;
        };
        let result = RoundResult::decide(player, opponent);
        match result.outcome {
            RoundOutcome::PlayerWin => self.player_score += 1,
            RoundOutcome::OpponentWin => self.opponent_score += 1,
            RoundOutcome::Tie => self.ties += 1,
        }
        self.history.push(result);
        self.rounds_completed += 1;
        self.phase = Phase::Scored;
        tracing::debug!(
            round = self.rounds_completed,
            player = self.player_score,
            opponent = self.opponent_score,
            ties = self.ties,
            "round scored"
        );
    }

    /// Whether all rounds of the session have been played.
    pub fn is_complete(&self) -> bool {
        self.rounds_completed >= ROUNDS_PER_SESSION
    }

    /// Enter the terminal phase and compute the winner, once: higher final
    /// score wins, equal scores yield `"Tie"`.
    pub fn finish(&mut self) {
        self.phase = Phase::Done;
        if self.winner.is_none() {
            let winner = if self.player_score > self.opponent_score {
                self.player_name.clone()
            } else if self.opponent_score > self.player_score {
                OPPONENT_NAME.to_string()
            } else {
                "Tie".to_string()
            };
            tracing::debug!(%winner, "session finished");
            self.winner = Some(winner);
        }
    }

    /// A deck failure: record it and enter [`Phase::Faulted`].
    pub fn fail(&mut self, message: String) {
        tracing::warn!(error = %message, "deck failure surfaced to session");
        self.last_error = Some(message);
        self.phase = Phase::Faulted;
    }

    /// The winning score, for the end-of-session summary.
    pub fn winning_score(&self) -> u32 {
        self.player_score.max(self.opponent_score)
    }
}
