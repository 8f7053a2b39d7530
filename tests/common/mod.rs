use puzzle_core::puzzle::Puzzle;
use trainer::ledger::AttemptLedger;
use trainer::rating::RatingStore;
use trainer::rules::BoardRules;
use trainer::session::PuzzleSession;
use trainer::storage::Storage;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The reference puzzle: opponent opens e2e4, the user answers e7e5, and the
/// opponent's g1f3 closes the line.
pub fn sample_puzzle() -> Puzzle {
    Puzzle {
        id: "P1".to_string(),
        fen: START_FEN.to_string(),
        moves: "e2e4 e7e5 g1f3".to_string(),
        rating: Some(1500),
        rating_deviation: Some(90),
    }
}

/// Build a ready-to-start session over shared in-memory storage.
pub async fn new_session(storage: &Storage, puzzle: Puzzle) -> PuzzleSession {
    let rating_store = RatingStore::new(storage.clone());
    let ledger = AttemptLedger::new(storage.clone());
    let user_rating = rating_store.initialize().await;
    let prior = ledger.find_by_puzzle_or_fen(&puzzle.id, &puzzle.fen).await;

    let rules = BoardRules::new(&puzzle.fen).expect("valid FEN");
    PuzzleSession::new(
        Box::new(rules),
        rating_store,
        ledger,
        storage.clone(),
        puzzle,
        user_rating,
        prior.as_ref(),
    )
    .expect("session setup")
}
