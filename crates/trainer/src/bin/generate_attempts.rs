//! Generate a realistic sample attempt history for dashboard development.
//!
//! Fills the `puzzleAttempts` ledger (and a matching `userRating`) with
//! attempts spread over the past ~180 days, with a gently improving solve
//! rate. Usage: `cargo run --bin generate-attempts [count]`.

use chrono::{Duration, Utc};
use rand::Rng;
use tracing_subscriber::EnvFilter;

use trainer::config::Config;
use trainer::corpus::CorpusStore;
use trainer::ledger::PuzzleAttempt;
use trainer::rating::UserRating;
use trainer::storage::{Storage, KEY_PUZZLE_ATTEMPTS, KEY_USER_RATING};

const HISTORY_DAYS: i64 = 180;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let count: usize = std::env::args()
        .nth(1)
        .and_then(|v| v.parse().ok())
        .unwrap_or(200);

    let config = Config::from_env();
    let storage = Storage::open(&config.storage_path).await?;
    let corpus = CorpusStore::new(storage.clone(), &config.corpus_path, config.release_date)
        .load()
        .await?;

    let mut rng = rand::thread_rng();
    let mut rating = 1500.0f64;
    let now = Utc::now();
    let mut attempts = Vec::with_capacity(count);

    for i in 0..count {
        let puzzle = &corpus[i % corpus.len()];
        // Keep puzzle ids unique once the corpus wraps, so the generated
        // ledger still holds one record per id.
        let puzzle_id = if i < corpus.len() {
            puzzle.id.clone()
        } else {
            format!("{}-{}", puzzle.id, i / corpus.len())
        };
        let progress = i as f64 / count as f64;

        // Solve rate drifts upward as the simulated player improves.
        let solved = rng.gen_bool((0.45 + 0.3 * progress).min(0.95));

        let puzzle_rating = puzzle
            .rating
            .map(f64::from)
            .unwrap_or_else(|| rng.gen_range(800.0..2400.0));
        let gap = puzzle_rating - rating;

        let delta = if solved {
            let base = if gap > 0.0 {
                rng.gen_range(15.0..40.0)
            } else {
                rng.gen_range(8.0..23.0)
            };
            (base + gap * 0.05).clamp(3.0, 45.0)
        } else {
            let base = if gap < 0.0 {
                rng.gen_range(12.0..32.0)
            } else {
                rng.gen_range(8.0..23.0)
            };
            (-base + gap.abs() * 0.03).clamp(-40.0, -2.0)
        };
        rating += delta;

        let difficulty = gap.abs() / 400.0;
        let time_spent = if solved {
            5.0 + difficulty * 85.0 + rng.gen_range(0.0..5.0)
        } else {
            5.0 + rng.gen_range(0.0..90.0)
        };

        let days_ago = ((count - i) as f64 / count as f64 * HISTORY_DAYS as f64) as i64;
        let timestamp = now
            - Duration::days(days_ago)
            - Duration::minutes(rng.gen_range(0..24 * 60));

        attempts.push(PuzzleAttempt {
            puzzle_id,
            fen: puzzle.fen.clone(),
            time_spent_seconds: (time_spent * 10.0).round() / 10.0,
            puzzle_rating: Some(puzzle_rating.round() as i32),
            puzzle_rating_deviation: puzzle
                .rating_deviation
                .or_else(|| Some(rng.gen_range(50..150))),
            is_solved: solved,
            is_finished: true,
            is_user_rating_updated: true,
            rating_change: Some(delta),
            timestamp,
        });
    }

    attempts.sort_by_key(|a| a.timestamp);
    storage.set(KEY_PUZZLE_ATTEMPTS, &attempts).await?;
    storage
        .set(
            KEY_USER_RATING,
            &UserRating {
                rating,
                rd: 85.0,
                volatility: 0.06,
                last_updated: now,
            },
        )
        .await?;

    tracing::info!(
        "Wrote {} sample attempts, final rating {:.0}",
        attempts.len(),
        rating
    );
    Ok(())
}
