//! Puzzle corpus store.
//!
//! The corpus lives in key-value storage (`puzzles` + `totalPuzzles`) so the
//! install-time context and the page context can share one parsed copy. A
//! missing or internally inconsistent cache is treated as "not loaded" and
//! rebuilt from the canonical CSV file.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use puzzle_core::daily::daily_index;
use puzzle_core::puzzle::{parse_corpus, Puzzle};

use crate::error::TrainerError;
use crate::retry;
use crate::storage::{Storage, KEY_PUZZLES, KEY_TOTAL_PUZZLES};

/// Retries while waiting for another context to finish populating storage.
const LOAD_ATTEMPTS: u32 = 4; // one immediate check + three retries
const LOAD_BACKOFF: Duration = Duration::from_millis(500);

pub struct CorpusStore {
    storage: Storage,
    csv_path: PathBuf,
    release_date: NaiveDate,
}

impl CorpusStore {
    pub fn new(storage: Storage, csv_path: impl Into<PathBuf>, release_date: NaiveDate) -> Self {
        Self {
            storage,
            csv_path: csv_path.into(),
            release_date,
        }
    }

    /// Load the corpus, preferring the storage cache and falling back to a
    /// CSV parse. Safe to call from multiple contexts: whoever finds a valid
    /// cache skips re-parsing.
    pub async fn load(&self) -> Result<Vec<Puzzle>, TrainerError> {
        if let Some(corpus) = self.cached().await {
            return Ok(corpus);
        }
        self.reload().await
    }

    /// Force a parse of the canonical CSV and rewrite the cache.
    pub async fn reload(&self) -> Result<Vec<Puzzle>, TrainerError> {
        let csv = tokio::fs::read_to_string(&self.csv_path)
            .await
            .map_err(|e| {
                TrainerError::Corpus(format!("cannot read {}: {e}", self.csv_path.display()))
            })?;

        let corpus = parse_corpus(&csv);
        if corpus.is_empty() {
            return Err(TrainerError::Corpus(format!(
                "{} contains no usable puzzles",
                self.csv_path.display()
            )));
        }

        tracing::info!("Parsed {} puzzles from {}", corpus.len(), self.csv_path.display());

        self.storage.set_logged(KEY_PUZZLES, &corpus).await;
        self.storage.set_logged(KEY_TOTAL_PUZZLES, &corpus.len()).await;

        Ok(corpus)
    }

    /// Today's puzzle. Polls the storage cache a bounded number of times
    /// (another context may still be writing it right after install), then
    /// forces a reload.
    pub async fn daily_puzzle(&self, today: NaiveDate) -> Result<Puzzle, TrainerError> {
        let corpus = match retry::poll(LOAD_ATTEMPTS, LOAD_BACKOFF, || self.cached()).await {
            Some(corpus) => corpus,
            None => self.reload().await?,
        };

        let index = daily_index(today, self.release_date, corpus.len());
        Ok(corpus[index].clone())
    }

    /// The cached corpus, or `None` when absent or when the recorded length
    /// disagrees with the actual sequence (a partial or torn write).
    async fn cached(&self) -> Option<Vec<Puzzle>> {
        let corpus: Vec<Puzzle> = self.storage.get(KEY_PUZZLES).await?;
        let total: usize = self.storage.get(KEY_TOTAL_PUZZLES).await?;

        if total == 0 || corpus.len() != total {
            return None;
        }
        Some(corpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puzzle_core::daily::RELEASE_DATE;
    use std::time::{SystemTime, UNIX_EPOCH};

    const CSV: &str = "PuzzleId,FEN,Moves,Rating,RatingDeviation\n\
        P1,rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1,e2e4 e7e5 g1f3,1420,85\n\
        P2,rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1,d2d4 d7d5 c2c4,1510,90\n";

    async fn write_csv(name: &str, contents: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("corpus-{name}-{ts}.csv"));
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_parses_csv_and_caches() {
        let path = write_csv("cache", CSV).await;
        let storage = Storage::in_memory();
        let store = CorpusStore::new(storage.clone(), &path, RELEASE_DATE);

        let corpus = store.load().await.unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(storage.get::<usize>(KEY_TOTAL_PUZZLES).await, Some(2));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_load_prefers_valid_cache_over_csv() {
        // Point at a nonexistent CSV; a valid cache must make that irrelevant.
        let storage = Storage::in_memory();
        let cached = vec![Puzzle {
            id: "C1".into(),
            fen: "fen".into(),
            moves: "e2e4".into(),
            rating: None,
            rating_deviation: None,
        }];
        storage.set(KEY_PUZZLES, &cached).await.unwrap();
        storage.set(KEY_TOTAL_PUZZLES, &1usize).await.unwrap();

        let store = CorpusStore::new(storage, "/nonexistent.csv", RELEASE_DATE);
        let corpus = store.load().await.unwrap();
        assert_eq!(corpus[0].id, "C1");
    }

    #[tokio::test]
    async fn test_length_mismatch_triggers_reload() {
        let path = write_csv("mismatch", CSV).await;
        let storage = Storage::in_memory();
        storage
            .set(KEY_PUZZLES, &Vec::<Puzzle>::new())
            .await
            .unwrap();
        storage.set(KEY_TOTAL_PUZZLES, &5usize).await.unwrap();

        let store = CorpusStore::new(storage, &path, RELEASE_DATE);
        let corpus = store.load().await.unwrap();
        assert_eq!(corpus.len(), 2);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_missing_csv_is_a_hard_error() {
        let store = CorpusStore::new(Storage::in_memory(), "/nonexistent.csv", RELEASE_DATE);
        assert!(matches!(store.load().await, Err(TrainerError::Corpus(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_daily_puzzle_is_stable_within_a_day() {
        let path = write_csv("daily", CSV).await;
        let store = CorpusStore::new(Storage::in_memory(), &path, RELEASE_DATE);

        let a = store.daily_puzzle(RELEASE_DATE).await.unwrap();
        let b = store.daily_puzzle(RELEASE_DATE).await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, "P1");

        let next = RELEASE_DATE.succ_opt().unwrap();
        assert_eq!(store.daily_puzzle(next).await.unwrap().id, "P2");

        let _ = tokio::fs::remove_file(&path).await;
    }
}
