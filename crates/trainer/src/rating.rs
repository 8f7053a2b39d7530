//! Persisted user rating and the per-attempt Glicko-2 update.
//!
//! The stored record is owned exclusively by this module; everything else
//! sees ratings only through `initialize` and `update`. At-most-once update
//! per attempt is enforced by the session via its rating-updated flag.

use chrono::{DateTime, Utc};
use puzzle_core::glicko::{self, Outcome, Rating};
use serde::{Deserialize, Serialize};

use crate::storage::{Storage, KEY_USER_RATING};

/// The persisted `userRating` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRating {
    pub rating: f64,
    pub rd: f64,
    pub volatility: f64,
    pub last_updated: DateTime<Utc>,
}

impl UserRating {
    fn from_glicko(rating: Rating) -> Self {
        Self {
            rating: rating.rating,
            rd: rating.deviation,
            volatility: rating.volatility,
            last_updated: Utc::now(),
        }
    }

    fn to_glicko(&self) -> Rating {
        Rating::new(self.rating, self.rd, self.volatility)
    }
}

impl Default for UserRating {
    fn default() -> Self {
        Self::from_glicko(Rating::default())
    }
}

/// Result of one rating update: the new persisted state plus the signed
/// change against the pre-update rating.
#[derive(Debug, Clone)]
pub struct RatingChange {
    pub rating: UserRating,
    pub delta: f64,
}

impl RatingChange {
    /// The delta rounded to whole points for display.
    pub fn delta_points(&self) -> i64 {
        self.delta.round() as i64
    }
}

#[derive(Clone)]
pub struct RatingStore {
    storage: Storage,
}

impl RatingStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Load the persisted rating, or create the default and persist it
    /// immediately so a fresh install has a durable record from day one.
    pub async fn initialize(&self) -> UserRating {
        if let Some(rating) = self.storage.get::<UserRating>(KEY_USER_RATING).await {
            return rating;
        }

        let rating = UserRating::default();
        self.storage.set_logged(KEY_USER_RATING, &rating).await;
        rating
    }

    /// Run one paired-comparison update against the puzzle-as-opponent and
    /// persist the result immediately.
    ///
    /// Unrated corpus rows play as a default-strength opponent.
    pub async fn update(
        &self,
        current: &UserRating,
        puzzle_rating: Option<i32>,
        puzzle_deviation: Option<i32>,
        solved: bool,
    ) -> RatingChange {
        let opponent = Rating::new(
            puzzle_rating.map_or(glicko::DEFAULT_RATING, f64::from),
            puzzle_deviation.map_or(glicko::DEFAULT_DEVIATION, f64::from),
            glicko::DEFAULT_VOLATILITY,
        );
        let outcome = if solved { Outcome::Win } else { Outcome::Loss };

        let updated = glicko::update(current.to_glicko(), opponent, outcome);
        let rating = UserRating::from_glicko(updated);
        let delta = rating.rating - current.rating;

        self.storage.set_logged(KEY_USER_RATING, &rating).await;

        RatingChange { rating, delta }
    }
}
