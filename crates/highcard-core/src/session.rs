//! Session controller: drives the round engine through ten rounds.
//!
//! [`SessionHandle::spawn`] starts one tokio task that owns the deck handle
//! and the only mutable [`SessionState`]. The task is the single logical
//! thread of the session: the two deck calls are its only suspension points
//! and their results are applied on the same task, so no locking is needed.
//! At most one timer is pending at a time — no transition sleeps until the
//! previous sleep has fired.
//!
//! Snapshots are pushed over a [`watch`] channel after every transition;
//! the presentation layer reads them and never mutates. Tearing the session
//! down ([`SessionHandle::shutdown`], or dropping the handle) aborts the
//! task, which cancels any pending timer and discards any in-flight deck
//! response before it can touch the state.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::cards::Card;
use crate::deck::{DeckApi, DeckHandle};
use crate::engine::{Phase, SessionState};

/// One countdown tick.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// How long revealed cards stay up before the round is scored.
pub const REVEAL_DELAY: Duration = Duration::from_secs(3);

/// Pause between a scored round and the next draw.
pub const ROUND_PACING_DELAY: Duration = Duration::from_millis(500);

/// Commands the presentation layer can send into a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Re-attempt the deck call that put the session into [`Phase::Faulted`].
    Retry,
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Owner-side handle to a running session.
///
/// Dropping the handle tears the session down.
pub struct SessionHandle {
    snapshots: watch::Receiver<SessionState>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Start a session: initialize state, request a shuffled deck, and play
    /// ten rounds, publishing a snapshot after every transition.
    pub fn spawn<D: DeckApi>(deck: D, player_name: &str, player_on_left: bool) -> Self {
        let state = SessionState::new(player_name, player_on_left);
        let (tx, rx) = watch::channel(state.clone());
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let runner = SessionRunner {
            deck,
            state,
            tx,
            commands: cmd_rx,
        };
        let task = tokio::spawn(runner.run());

        Self {
            snapshots: rx,
            commands: cmd_tx,
            task,
        }
    }

    /// A fresh receiver for state snapshots.
    pub fn snapshots(&self) -> watch::Receiver<SessionState> {
        self.snapshots.clone()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> SessionState {
        self.snapshots.borrow().clone()
    }

    /// Send a command to the session task. Ignored once the task has ended.
    pub fn send(&self, cmd: SessionCommand) {
        let _ = self.commands.send(cmd);
    }

    /// Tear the session down: aborts the task, cancelling any pending
    /// countdown/pacing timer and discarding any in-flight deck response.
    pub fn shutdown(&self) {
        self.task.abort();
    }

    /// Whether the session task has ended (completed, faulted out, or torn
    /// down).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// SessionRunner
// ---------------------------------------------------------------------------

/// The session task body. Owns the state; everything else sees snapshots.
struct SessionRunner<D: DeckApi> {
    deck: D,
    state: SessionState,
    tx: watch::Sender<SessionState>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
}

impl<D: DeckApi> SessionRunner<D> {
    async fn run(mut self) {
        let Some(handle) = self.acquire_deck().await else {
            return;
        };

        loop {
            let Some((player, opponent)) = self.draw_two(&handle).await else {
                return;
            };
            self.update(|s| s.cards_drawn(player, opponent));

            while self.state.countdown > 0 {
                tokio::time::sleep(TICK_INTERVAL).await;
                self.update(|s| {
                    s.tick();
                });
            }

            self.update(|s| s.reveal());
            tokio::time::sleep(REVEAL_DELAY).await;
            self.update(|s| s.score());

            if self.state.is_complete() {
                self.update(|s| s.finish());
                return;
            }
            tokio::time::sleep(ROUND_PACING_DELAY).await;
        }
    }

    /// Request a fresh shuffled deck, surfacing failures and waiting for a
    /// retry command. `None` means the session was abandoned.
    async fn acquire_deck(&mut self) -> Option<DeckHandle> {
        loop {
            self.publish();
            match self.deck.new_shuffled_deck().await {
                Ok(handle) => return Some(handle),
                Err(e) => {
                    self.update(|s| s.fail(e.to_string()));
                    if !self.wait_for_retry().await {
                        return None;
                    }
                    self.update(|s| {
                        s.last_error = None;
                        s.phase = Phase::Idle;
                    });
                }
            }
        }
    }

    /// Draw the round's two cards: the first is the player's, the second
    /// the opponent's. Failures are surfaced and retried on command; `None`
    /// means the session was abandoned.
    async fn draw_two(&mut self, handle: &DeckHandle) -> Option<(Card, Card)> {
        loop {
            self.update(|s| s.begin_drawing());
            match self.deck.draw(handle, 2).await {
                Ok(cards) => match <[Card; 2]>::try_from(cards) {
                    Ok([player, opponent]) => return Some((player, opponent)),
                    Err(cards) => {
                        // The deck client validates cardinality; re-check so a
                        // misbehaving implementation faults instead of panicking.
                        self.update(|s| {
                            s.fail(format!("draw returned {} cards, wanted 2", cards.len()))
                        });
                        if !self.wait_for_retry().await {
                            return None;
                        }
                    }
                },
                Err(e) => {
                    self.update(|s| s.fail(e.to_string()));
                    if !self.wait_for_retry().await {
                        return None;
                    }
                }
            }
        }
    }

    /// Block in [`Phase::Faulted`] until a retry command arrives. Returns
    /// `false` when every command sender is gone (handle dropped).
    async fn wait_for_retry(&mut self) -> bool {
        match self.commands.recv().await {
            Some(SessionCommand::Retry) => true,
            None => false,
        }
    }

    fn update(&mut self, f: impl FnOnce(&mut SessionState)) {
        f(&mut self.state);
        self.publish();
    }

    fn publish(&self) {
        self.tx.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};
    use crate::deck::DeckError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A deck that replays a script of responses.
    struct ScriptedDeck {
        new_decks: Mutex<VecDeque<Result<DeckHandle, DeckError>>>,
        draws: Mutex<VecDeque<Result<Vec<Card>, DeckError>>>,
    }

    impl ScriptedDeck {
        fn new(
            new_decks: Vec<Result<DeckHandle, DeckError>>,
            draws: Vec<Result<Vec<Card>, DeckError>>,
        ) -> Self {
            Self {
                new_decks: Mutex::new(new_decks.into()),
                draws: Mutex::new(draws.into()),
            }
        }
    }

    impl DeckApi for ScriptedDeck {
        async fn new_shuffled_deck(&self) -> Result<DeckHandle, DeckError> {
            self.new_decks
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DeckError::Network("script exhausted".to_string())))
        }

        async fn draw(&self, _handle: &DeckHandle, _count: usize) -> Result<Vec<Card>, DeckError> {
            self.draws
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DeckError::Network("script exhausted".to_string())))
        }
    }

    fn c(rank: Rank) -> Card {
        Card {
            rank,
            suit: Suit::Spades,
            image_url: String::new(),
        }
    }

    fn deck_handle() -> Result<DeckHandle, DeckError> {
        crate::deck::deck_from_response(crate::deck::NewDeckResponse {
            success: true,
            deck_id: "test-deck".to_string(),
            shuffled: true,
            remaining: 52,
        })
    }

    /// Ten rounds the player wins 6 / loses 3 / ties 1.
    fn ten_rounds() -> Vec<Result<Vec<Card>, DeckError>> {
        let pairs = [
            (Rank::King, Rank::Queen),
            (Rank::Ace, Rank::Two),
            (Rank::Ten, Rank::Nine),
            (Rank::Three, Rank::Jack),
            (Rank::Seven, Rank::Seven),
            (Rank::Queen, Rank::Four),
            (Rank::Five, Rank::Six),
            (Rank::Nine, Rank::Eight),
            (Rank::Two, Rank::Ace),
            (Rank::Jack, Rank::Ten),
        ];
        pairs
            .into_iter()
            .map(|(p, o)| Ok(vec![c(p), c(o)]))
            .collect()
    }

    /// Drain snapshots until the session reaches `Done` or the task ends.
    async fn collect_until_done(rx: &mut watch::Receiver<SessionState>) -> Vec<SessionState> {
        let mut seen = Vec::new();
        loop {
            if rx.changed().await.is_err() {
                break;
            }
            let snap = rx.borrow_and_update().clone();
            let done = snap.phase == Phase::Done;
            seen.push(snap);
            if done {
                break;
            }
        }
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn full_session_end_to_end() {
        let deck = ScriptedDeck::new(vec![deck_handle()], ten_rounds());
        let handle = SessionHandle::spawn(deck, "Gabi", true);
        let mut rx = handle.snapshots();

        let seen = collect_until_done(&mut rx).await;
        let last = seen.last().unwrap();

        assert_eq!(last.phase, Phase::Done);
        assert_eq!(last.rounds_completed, 10);
        assert_eq!(last.player_score + last.opponent_score + last.ties, 10);
        assert_eq!(
            (last.player_score, last.opponent_score, last.ties),
            (6, 3, 1)
        );
        assert_eq!(last.winner.as_deref(), Some("Gabi"));
        assert_eq!(last.history.len(), 10);

        // Each round increments rounds_completed by exactly 1. The watch
        // channel coalesces the round-10 Scored snapshot into Done, so the
        // last observed value is the Done snapshot.
        let scored: Vec<u32> = seen
            .iter()
            .filter(|s| s.phase == Phase::Scored || s.phase == Phase::Done)
            .map(|s| s.rounds_completed)
            .collect();
        assert_eq!(scored, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        // The countdown ran from 5; cards were revealed when it hit 0.
        assert!(seen.iter().any(|s| s.phase == Phase::Countdown && s.countdown == 5));
        assert!(seen.iter().any(|s| s.phase == Phase::Countdown && s.countdown == 1));
        assert!(seen.iter().any(|s| s.phase == Phase::Revealing && s.countdown == 0));
    }

    #[tokio::test(start_paused = true)]
    async fn draw_failure_is_surfaced_and_retryable() {
        let mut draws = vec![Err(DeckError::Network("connection reset".to_string()))];
        draws.extend(ten_rounds());
        let deck = ScriptedDeck::new(vec![deck_handle()], draws);

        let handle = SessionHandle::spawn(deck, "Gabi", false);
        let mut rx = handle.snapshots();

        // Drawing never silently stalls: the failure shows up as Faulted.
        loop {
            rx.changed().await.unwrap();
            let snap = rx.borrow_and_update().clone();
            if snap.phase == Phase::Faulted {
                assert!(snap.last_error.as_deref().unwrap().contains("connection reset"));
                break;
            }
            assert_ne!(snap.phase, Phase::Done, "session finished without surfacing the error");
        }

        handle.send(SessionCommand::Retry);
        let seen = collect_until_done(&mut rx).await;
        let last = seen.last().unwrap();
        assert_eq!(last.phase, Phase::Done);
        assert_eq!(last.rounds_completed, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn deck_creation_failure_is_surfaced_and_retryable() {
        let deck = ScriptedDeck::new(
            vec![
                Err(DeckError::Protocol("empty deck_id".to_string())),
                deck_handle(),
            ],
            ten_rounds(),
        );
        let handle = SessionHandle::spawn(deck, "Gabi", true);
        let mut rx = handle.snapshots();

        loop {
            rx.changed().await.unwrap();
            if rx.borrow_and_update().phase == Phase::Faulted {
                break;
            }
        }
        handle.send(SessionCommand::Retry);

        let seen = collect_until_done(&mut rx).await;
        assert_eq!(seen.last().unwrap().phase, Phase::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_mid_countdown_stops_all_mutation() {
        let deck = ScriptedDeck::new(vec![deck_handle()], ten_rounds());
        let handle = SessionHandle::spawn(deck, "Gabi", true);
        let mut rx = handle.snapshots();

        // Wait until the first countdown is running.
        loop {
            rx.changed().await.unwrap();
            if rx.borrow_and_update().phase == Phase::Countdown {
                break;
            }
        }

        handle.shutdown();
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }

        let frozen = rx.borrow().clone();
        assert_eq!(frozen.phase, Phase::Countdown);
        assert_eq!(frozen.rounds_completed, 0);

        // Long after every timer would have fired, nothing has been applied
        // to the dead session's state.
        tokio::time::sleep(Duration::from_secs(120)).await;
        let after = rx.borrow().clone();
        assert_eq!(after.phase, frozen.phase);
        assert_eq!(after.countdown, frozen.countdown);
        assert_eq!(after.rounds_completed, 0);
        assert_eq!(after.player_score + after.opponent_score + after.ties, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_ends_a_faulted_session() {
        let deck = ScriptedDeck::new(
            vec![Err(DeckError::Network("unreachable".to_string()))],
            Vec::new(),
        );
        let handle = SessionHandle::spawn(deck, "Gabi", true);
        let mut rx = handle.snapshots();

        loop {
            rx.changed().await.unwrap();
            if rx.borrow_and_update().phase == Phase::Faulted {
                break;
            }
        }

        drop(handle);

        // Dropping the handle aborts the task; no further snapshots arrive
        // and the last one is unchanged.
        assert!(rx.changed().await.is_err());
        assert_eq!(rx.borrow().phase, Phase::Faulted);
    }
}
