//! Puzzle progress state machine.
//!
//! One session per active puzzle. The machine owns the board lock, the
//! solution-line cursor, and the sticky incorrect flag, and is the single
//! code path that records attempts — so the write order (rating update
//! persisted first, ledger entry second) cannot drift between call sites.
//!
//! All pacing delays happen inside `&mut self` async methods; a submitted
//! move is rejected synchronously while the board is locked, and no detached
//! timer can outlive the session value.

use std::time::Duration;

use chrono::Utc;
use puzzle_core::puzzle::Puzzle;
use tokio::time::{sleep, Instant};

use crate::error::TrainerError;
use crate::ledger::{AttemptLedger, PuzzleAttempt};
use crate::rating::{RatingStore, UserRating};
use crate::rules::{Rules, Side};
use crate::storage::{Storage, KEY_HELP_WARNING_SHOWN};

/// Pause before the opponent's first (setup) move.
const FIRST_MOVE_DELAY: Duration = Duration::from_millis(700);
/// Pause before the opponent answers a correct user move.
const OPPONENT_REPLY_DELAY: Duration = Duration::from_millis(500);
/// How long an incorrect move stays on the board before reverting.
const INCORRECT_REVERT_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    OpponentToMove,
    UserToMove,
    Solved,
    Abandoned,
}

/// What happened to a submitted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Board locked, wrong phase, or not a legal move: ignored without any
    /// state change.
    Rejected,
    /// Legal but not the solution ply; the move was reverted.
    Incorrect,
    /// The expected ply. `solved` marks the end of the solution line.
    Correct { solved: bool },
}

/// Outcome of asking for help (hint or reveal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpOutcome {
    /// Not in a state where help applies; nothing happened.
    Rejected,
    /// The one-time warning has not been acknowledged yet; call
    /// `acknowledge_help_warning` and retry.
    NeedsAcknowledgement,
    /// Help was granted. For a hint this carries the from-square of the next
    /// ply; for a reveal the ply was played.
    Granted { solved_line_finished: bool },
}

pub struct PuzzleSession {
    rules: Box<dyn Rules>,
    rating_store: RatingStore,
    ledger: AttemptLedger,
    storage: Storage,

    puzzle: Puzzle,
    solution: Vec<String>,
    current_move_index: usize,
    user_side: Side,

    state: SessionState,
    locked: bool,
    has_incorrect_moves: bool,

    user_rating: UserRating,
    rating_updated: bool,
    rating_change: Option<f64>,

    start_time: Instant,
}

impl PuzzleSession {
    /// Set up a session for `puzzle`. A prior unfinished attempt seeds the
    /// rating bookkeeping so the update stays at-most-once per attempt
    /// across page reloads.
    pub fn new(
        mut rules: Box<dyn Rules>,
        rating_store: RatingStore,
        ledger: AttemptLedger,
        storage: Storage,
        puzzle: Puzzle,
        user_rating: UserRating,
        prior_attempt: Option<&PuzzleAttempt>,
    ) -> Result<Self, TrainerError> {
        rules.set_position(&puzzle.fen)?;
        let solution = puzzle.plies().iter().map(|s| s.to_string()).collect();
        // The first solution ply belongs to the opponent, so the user plays
        // the side that is not to move in the starting position.
        let user_side = rules.side_to_move().other();

        Ok(Self {
            rules,
            rating_store,
            ledger,
            storage,
            puzzle,
            solution,
            current_move_index: 0,
            user_side,
            state: SessionState::NotStarted,
            locked: true,
            has_incorrect_moves: false,
            user_rating,
            rating_updated: prior_attempt.map_or(false, |a| a.is_user_rating_updated),
            rating_change: prior_attempt.and_then(|a| a.rating_change),
            start_time: Instant::now(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn has_incorrect_moves(&self) -> bool {
        self.has_incorrect_moves
    }

    pub fn current_move_index(&self) -> usize {
        self.current_move_index
    }

    pub fn user_rating(&self) -> &UserRating {
        &self.user_rating
    }

    pub fn rating_change(&self) -> Option<f64> {
        self.rating_change
    }

    pub fn position_fen(&self) -> String {
        self.rules.fen()
    }

    /// The side the user is solving for: the opponent owns the first ply.
    pub fn user_side(&self) -> Side {
        self.user_side
    }

    /// Play the opponent's setup move after the opening pause and hand the
    /// board to the user.
    pub async fn start(&mut self) -> Result<(), TrainerError> {
        if self.state != SessionState::NotStarted || self.solution.is_empty() {
            return Ok(());
        }

        self.state = SessionState::OpponentToMove;
        self.locked = true;
        sleep(FIRST_MOVE_DELAY).await;

        self.play_expected_ply()?;
        self.locked = false;
        self.state = SessionState::UserToMove;
        Ok(())
    }

    /// Submit a user move. Rejected synchronously while the board is locked;
    /// no queueing.
    pub async fn submit_move(&mut self, from: &str, to: &str) -> Result<MoveOutcome, TrainerError> {
        if self.locked
            || self.state != SessionState::UserToMove
            || self.current_move_index >= self.solution.len()
        {
            return Ok(MoveOutcome::Rejected);
        }

        let expected = &self.solution[self.current_move_index];
        let submitted = format!("{from}{to}");

        if submitted != *expected {
            // An illegal move never reaches the board; only a legal-but-wrong
            // move counts as incorrect.
            if !self.rules.apply(from, to) {
                return Ok(MoveOutcome::Rejected);
            }
            self.handle_incorrect_move().await;
            return Ok(MoveOutcome::Incorrect);
        }

        self.play_expected_ply()?;

        if self.current_move_index >= self.solution.len() {
            self.finish_solved().await;
            return Ok(MoveOutcome::Correct { solved: true });
        }

        // Opponent answers after a short pause; board stays locked until the
        // reply lands.
        self.locked = true;
        sleep(OPPONENT_REPLY_DELAY).await;
        self.play_expected_ply()?;

        // Some solution lines end on the opponent's reply.
        if self.current_move_index >= self.solution.len() {
            self.finish_solved().await;
            return Ok(MoveOutcome::Correct { solved: true });
        }

        self.locked = false;
        Ok(MoveOutcome::Correct { solved: false })
    }

    /// Reveal the next solution ply and play it on the user's behalf.
    /// Disqualifies solved-credit; revealing the final ply finishes the
    /// attempt as failed.
    pub async fn reveal_next(&mut self) -> Result<HelpOutcome, TrainerError> {
        if let Some(rejection) = self.help_gate().await {
            return Ok(rejection);
        }

        let is_last = self.current_move_index == self.solution.len() - 1;
        self.has_incorrect_moves = true;
        self.record_attempt(false, is_last).await;

        self.play_expected_ply()?;

        if self.current_move_index >= self.solution.len() {
            self.locked = true;
            self.state = SessionState::Solved;
            return Ok(HelpOutcome::Granted {
                solved_line_finished: true,
            });
        }

        self.locked = true;
        sleep(OPPONENT_REPLY_DELAY).await;
        self.play_expected_ply()?;

        if self.current_move_index >= self.solution.len() {
            // The opponent's reply exhausted the line; the attempt is over,
            // still without solved-credit.
            self.record_attempt(false, true).await;
            self.state = SessionState::Solved;
            return Ok(HelpOutcome::Granted {
                solved_line_finished: true,
            });
        }

        self.locked = false;
        Ok(HelpOutcome::Granted {
            solved_line_finished: false,
        })
    }

    /// Highlight help: returns the from-square of the next ply without
    /// playing it. Disqualifies solved-credit but never finishes the
    /// attempt.
    pub async fn hint(&mut self) -> Result<(HelpOutcome, Option<String>), TrainerError> {
        if let Some(rejection) = self.help_gate().await {
            return Ok((rejection, None));
        }

        self.has_incorrect_moves = true;
        self.record_attempt(false, false).await;

        let from = self.solution[self.current_move_index][..2].to_string();
        Ok((
            HelpOutcome::Granted {
                solved_line_finished: false,
            },
            Some(from),
        ))
    }

    /// Record the one-time acknowledgement that using help forfeits
    /// solved-credit.
    pub async fn acknowledge_help_warning(&self) {
        self.storage.set_logged(KEY_HELP_WARNING_SHOWN, &true).await;
    }

    /// Give up on the puzzle: finishes the attempt as failed.
    pub async fn abandon(&mut self) {
        if matches!(self.state, SessionState::Solved | SessionState::Abandoned) {
            return;
        }
        self.has_incorrect_moves = true;
        self.record_attempt(false, true).await;
        self.locked = true;
        self.state = SessionState::Abandoned;
    }

    /// Both help actions share the same gate: user to move, board unlocked,
    /// line unfinished, warning acknowledged (or nothing left to forfeit).
    /// Returns the rejection to surface, or `None` when help may proceed.
    async fn help_gate(&self) -> Option<HelpOutcome> {
        if self.locked
            || self.state != SessionState::UserToMove
            || self.current_move_index >= self.solution.len()
        {
            return Some(HelpOutcome::Rejected);
        }

        let warning_shown: bool = self
            .storage
            .get(KEY_HELP_WARNING_SHOWN)
            .await
            .unwrap_or(false);

        if !warning_shown && !self.rating_updated {
            return Some(HelpOutcome::NeedsAcknowledgement);
        }

        None
    }

    /// Apply the ply the solution expects at the cursor and advance it.
    fn play_expected_ply(&mut self) -> Result<(), TrainerError> {
        let ply = &self.solution[self.current_move_index];
        let (from, to) = ply.split_at(2);
        if !self.rules.apply(from, to) {
            // A solution ply the rules engine rejects means corrupt corpus
            // data; there is no way to continue this puzzle.
            return Err(TrainerError::Corpus(format!(
                "puzzle {}: solution ply {ply} is not legal",
                self.puzzle.id
            )));
        }
        self.current_move_index += 1;
        Ok(())
    }

    async fn handle_incorrect_move(&mut self) {
        if !self.has_incorrect_moves {
            self.has_incorrect_moves = true;
            // First incorrect move settles the rating and opens the record.
            self.record_attempt(false, false).await;
        }

        self.locked = true;
        sleep(INCORRECT_REVERT_DELAY).await;
        self.rules.undo();
        self.locked = false;
    }

    async fn finish_solved(&mut self) {
        self.state = SessionState::Solved;
        self.locked = true;

        if !self.has_incorrect_moves {
            self.record_attempt(true, true).await;
        }
    }

    /// The only place attempts are written. Rating first, ledger second: a
    /// crash in between must never leave a ledger entry claiming a rating
    /// update that did not happen.
    async fn record_attempt(&mut self, solved: bool, finished: bool) {
        if !self.rating_updated {
            let change = self
                .rating_store
                .update(
                    &self.user_rating,
                    self.puzzle.rating,
                    self.puzzle.rating_deviation,
                    solved,
                )
                .await;
            self.user_rating = change.rating.clone();
            self.rating_change = Some(change.delta);
            self.rating_updated = true;
        }

        let attempt = PuzzleAttempt {
            puzzle_id: self.puzzle.id.clone(),
            fen: self.puzzle.fen.clone(),
            time_spent_seconds: self.start_time.elapsed().as_secs_f64(),
            puzzle_rating: self.puzzle.rating,
            puzzle_rating_deviation: self.puzzle.rating_deviation,
            is_solved: solved,
            is_finished: solved || finished,
            is_user_rating_updated: self.rating_updated,
            rating_change: self.rating_change,
            timestamp: Utc::now(),
        };

        self.ledger.record(attempt).await;
    }
}
