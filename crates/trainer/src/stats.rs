//! Aggregate statistics over the attempt ledger, for the dashboard consumer.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::ledger::PuzzleAttempt;

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStats {
    pub total: usize,
    pub solved: usize,
    /// Percentage of attempts solved, 0-100.
    pub solve_rate: u32,
    pub avg_time_seconds: f64,
    /// Consecutive days solved, counting back from `today`.
    pub current_streak: u32,
    /// Longest run of solved attempts across consecutive days; any failed
    /// attempt breaks the run.
    pub best_streak: u32,
}

/// Compute stats for a slice of attempts. `today` anchors the current-streak
/// count; the current streak is per calendar day, the latest attempt of a
/// day deciding it.
pub fn compute(attempts: &[PuzzleAttempt], today: NaiveDate) -> LedgerStats {
    let total = attempts.len();
    let solved = attempts.iter().filter(|a| a.is_solved).count();

    let solve_rate = if total > 0 {
        ((solved as f64 / total as f64) * 100.0).round() as u32
    } else {
        0
    };

    let avg_time_seconds = if total > 0 {
        attempts.iter().map(|a| a.time_spent_seconds).sum::<f64>() / total as f64
    } else {
        0.0
    };

    let by_day = attempts_by_day(attempts);

    LedgerStats {
        total,
        solved,
        solve_rate,
        avg_time_seconds,
        current_streak: current_streak(&by_day, today),
        best_streak: best_streak(attempts),
    }
}

/// The latest attempt of each day decides whether that day counts as
/// solved.
fn attempts_by_day(attempts: &[PuzzleAttempt]) -> HashMap<NaiveDate, bool> {
    let mut sorted: Vec<&PuzzleAttempt> = attempts.iter().collect();
    sorted.sort_by_key(|a| a.timestamp);

    let mut by_day = HashMap::new();
    for attempt in sorted {
        by_day.insert(attempt.timestamp.date_naive(), attempt.is_solved);
    }
    by_day
}

fn current_streak(by_day: &HashMap<NaiveDate, bool>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while by_day.get(&day).copied().unwrap_or(false) {
        streak += 1;
        let Some(prev) = day.pred_opt() else { break };
        day = prev;
    }
    streak
}

/// Walk attempts in timestamp order. Any failed attempt resets the run; a
/// solved attempt on the day after the previous solved one extends it, and
/// a solved attempt later the same day leaves it unchanged.
fn best_streak(attempts: &[PuzzleAttempt]) -> u32 {
    let mut sorted: Vec<&PuzzleAttempt> = attempts.iter().collect();
    sorted.sort_by_key(|a| a.timestamp);

    let mut best = 0u32;
    let mut run = 0u32;
    let mut last: Option<NaiveDate> = None;

    for attempt in sorted {
        if !attempt.is_solved {
            run = 0;
            continue;
        }

        let day = attempt.timestamp.date_naive();
        run = match last {
            None => 1,
            Some(prev) => match (day - prev).num_days() {
                0 => run,
                1 => run + 1,
                _ => 1,
            },
        };
        best = best.max(run);
        last = Some(day);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn attempt_on(y: i32, m: u32, d: u32, solved: bool) -> PuzzleAttempt {
        PuzzleAttempt {
            puzzle_id: format!("P{y}{m}{d}"),
            fen: "fen".into(),
            time_spent_seconds: 30.0,
            puzzle_rating: Some(1500),
            puzzle_rating_deviation: Some(90),
            is_solved: solved,
            is_finished: true,
            is_user_rating_updated: true,
            rating_change: None,
            timestamp: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_ledger() {
        let stats = compute(&[], day(2026, 1, 10));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.solve_rate, 0);
        assert_eq!(stats.current_streak, 0);
    }

    #[test]
    fn test_totals_and_solve_rate() {
        let attempts = vec![
            attempt_on(2026, 1, 1, true),
            attempt_on(2026, 1, 2, false),
            attempt_on(2026, 1, 3, true),
        ];
        let stats = compute(&attempts, day(2026, 1, 3));
        assert_eq!(stats.total, 3);
        assert_eq!(stats.solved, 2);
        assert_eq!(stats.solve_rate, 67);
        assert!((stats.avg_time_seconds - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_current_streak_counts_back_from_today() {
        let attempts = vec![
            attempt_on(2026, 1, 5, true),
            attempt_on(2026, 1, 6, true),
            attempt_on(2026, 1, 7, true),
        ];
        assert_eq!(compute(&attempts, day(2026, 1, 7)).current_streak, 3);
        // A day without any attempt breaks the chain.
        assert_eq!(compute(&attempts, day(2026, 1, 9)).current_streak, 0);
    }

    #[test]
    fn test_best_streak_survives_later_failures() {
        let attempts = vec![
            attempt_on(2026, 1, 1, true),
            attempt_on(2026, 1, 2, true),
            attempt_on(2026, 1, 3, true),
            attempt_on(2026, 1, 4, false),
            attempt_on(2026, 1, 5, true),
        ];
        let stats = compute(&attempts, day(2026, 1, 5));
        assert_eq!(stats.best_streak, 3);
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn test_latest_attempt_of_the_day_decides_current_streak() {
        // Failed in the morning, solved later the same day: the day counts
        // as solved.
        let mut failed = attempt_on(2026, 1, 5, false);
        failed.timestamp = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let solved = attempt_on(2026, 1, 5, true);

        let stats = compute(&[failed, solved], day(2026, 1, 5));
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn test_best_streak_resets_on_any_failed_attempt() {
        // Solved on two consecutive days, then a failed attempt late on the
        // second day. The failure breaks the run even though both days end
        // up having a solved attempt.
        let mut late_fail = attempt_on(2026, 1, 2, false);
        late_fail.timestamp = Utc.with_ymd_and_hms(2026, 1, 2, 20, 0, 0).unwrap();
        let attempts = vec![
            attempt_on(2026, 1, 1, true),
            attempt_on(2026, 1, 2, true),
            late_fail,
            attempt_on(2026, 1, 3, true),
        ];

        let stats = compute(&attempts, day(2026, 1, 3));
        assert_eq!(stats.best_streak, 2);
    }

    #[test]
    fn test_same_day_solved_attempts_do_not_inflate_best_streak() {
        let mut second = attempt_on(2026, 1, 1, true);
        second.timestamp = Utc.with_ymd_and_hms(2026, 1, 1, 18, 0, 0).unwrap();
        second.puzzle_id = "P-second".into();

        let stats = compute(&[attempt_on(2026, 1, 1, true), second], day(2026, 1, 1));
        assert_eq!(stats.best_streak, 1);
    }
}
