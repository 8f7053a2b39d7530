//! Trainer configuration from environment variables.

use std::env;

use chrono::NaiveDate;
use puzzle_core::daily::RELEASE_DATE;

#[derive(Clone, Debug)]
pub struct Config {
    /// Path to the canonical CSV puzzle corpus.
    pub corpus_path: String,

    /// Path to the JSON key-value storage file.
    pub storage_path: String,

    /// Release date anchoring the daily puzzle rotation.
    pub release_date: NaiveDate,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            corpus_path: env::var("CORPUS_PATH")
                .unwrap_or_else(|_| "static/puzzles.csv".to_string()),
            storage_path: env::var("STORAGE_PATH")
                .unwrap_or_else(|_| "data/trainer.json".to_string()),
            release_date: env::var("RELEASE_DATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(RELEASE_DATE),
        }
    }
}
