//! Pure domain logic for the daily puzzle trainer: the puzzle corpus model,
//! deterministic daily selection, the Glicko-2 rating update, and rating
//! tier/difficulty bands. No I/O lives here.

pub mod daily;
pub mod glicko;
pub mod puzzle;
pub mod tier;
