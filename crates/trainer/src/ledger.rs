//! Attempt ledger: one record per puzzle, first attempt wins unless a later
//! event upgrades it from unfinished to finished.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{Storage, KEY_PUZZLE_ATTEMPTS};

/// A recorded attempt at one puzzle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleAttempt {
    pub puzzle_id: String,
    /// Redundant copy of the starting position; fallback matching key for
    /// legacy records that predate puzzle ids.
    pub fen: String,
    pub time_spent_seconds: f64,
    pub puzzle_rating: Option<i32>,
    pub puzzle_rating_deviation: Option<i32>,
    pub is_solved: bool,
    pub is_finished: bool,
    pub is_user_rating_updated: bool,
    pub rating_change: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Merge a new attempt into the ledger.
///
/// - no record for this puzzle id: append;
/// - existing record unfinished and the new event finishes: overwrite;
/// - existing record already finished: no-op (idempotent).
pub fn apply(attempts: &mut Vec<PuzzleAttempt>, attempt: PuzzleAttempt) {
    match attempts.iter_mut().find(|a| a.puzzle_id == attempt.puzzle_id) {
        None => attempts.push(attempt),
        Some(existing) if !existing.is_finished && attempt.is_finished => *existing = attempt,
        Some(_) => {}
    }
}

#[derive(Clone)]
pub struct AttemptLedger {
    storage: Storage,
}

impl AttemptLedger {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn all(&self) -> Vec<PuzzleAttempt> {
        self.storage
            .get(KEY_PUZZLE_ATTEMPTS)
            .await
            .unwrap_or_default()
    }

    /// Record an attempt under the merge rules of [`apply`] and persist the
    /// ledger.
    pub async fn record(&self, attempt: PuzzleAttempt) {
        let mut attempts = self.all().await;
        apply(&mut attempts, attempt);
        self.storage.set_logged(KEY_PUZZLE_ATTEMPTS, &attempts).await;
    }

    /// Find an attempt by puzzle id, falling back to FEN for legacy records.
    pub async fn find_by_puzzle_or_fen(&self, puzzle_id: &str, fen: &str) -> Option<PuzzleAttempt> {
        let attempts = self.all().await;
        attempts
            .iter()
            .find(|a| a.puzzle_id == puzzle_id)
            .or_else(|| attempts.iter().find(|a| a.fen == fen))
            .cloned()
    }

    /// Clear all recorded attempts. Rating-update eligibility goes with
    /// them; the persisted user rating itself is untouched.
    pub async fn reset(&self) {
        if let Err(e) = self.storage.remove(KEY_PUZZLE_ATTEMPTS).await {
            tracing::warn!("Failed to clear attempts: {e}");
        }
    }
}
