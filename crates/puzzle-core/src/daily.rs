//! Deterministic daily puzzle selection.
//!
//! Each calendar day maps to a stable corpus index: the number of days since
//! the release date, floor-modulo the corpus length. Dates are truncated to
//! local midnight by the caller (`NaiveDate` carries no time component), so
//! the same day always picks the same puzzle regardless of time of day.

use chrono::NaiveDate;

/// The day the first puzzle went live.
pub const RELEASE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 8, 9) {
    Some(date) => date,
    None => panic!("invalid release date"),
};

/// Whole days elapsed between the release date and `today`. Negative if the
/// clock is set before release.
pub fn days_since_release(today: NaiveDate, release: NaiveDate) -> i64 {
    (today - release).num_days()
}

/// Map a calendar day to a corpus index.
///
/// Uses `rem_euclid` so a pre-release clock (negative day delta) still lands
/// in `[0, corpus_len)` instead of indexing out of bounds.
///
/// `corpus_len` must be non-zero; an empty corpus has no index to pick.
pub fn daily_index(today: NaiveDate, release: NaiveDate, corpus_len: usize) -> usize {
    debug_assert!(corpus_len > 0);
    days_since_release(today, release).rem_euclid(corpus_len as i64) as usize
}
