//! Trainer error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("Corpus unavailable: {0}")]
    Corpus(String),

    #[error("Invalid position: {0}")]
    InvalidFen(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
