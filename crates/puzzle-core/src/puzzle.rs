//! Puzzle data model and corpus parsing.
//!
//! The corpus is a flat CSV file (`id,fen,moves,rating,ratingDeviation`) with
//! a header row. The last two columns are optional — early corpus exports
//! carried only id/fen/moves.

use serde::{Deserialize, Serialize};

/// A single puzzle from the corpus. Immutable once loaded.
///
/// `moves` is the full solution line as space-separated `<from><to>` plies,
/// alternating opponent/user, starting with the opponent's move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub id: String,
    pub fen: String,
    pub moves: String,
    pub rating: Option<i32>,
    pub rating_deviation: Option<i32>,
}

impl Puzzle {
    /// Split the solution line into individual plies.
    pub fn plies(&self) -> Vec<&str> {
        self.moves.split_whitespace().collect()
    }
}

/// Parse the canonical CSV corpus. The header row is skipped, as are blank
/// lines. Malformed rows are dropped individually rather than failing the
/// whole load — each row is independent.
pub fn parse_corpus(csv: &str) -> Vec<Puzzle> {
    csv.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Option<Puzzle> {
    let mut fields = line.split(',');
    let id = fields.next()?.trim();
    let fen = fields.next()?.trim();
    let moves = fields.next()?.trim();

    if id.is_empty() || fen.is_empty() || moves.is_empty() {
        return None;
    }

    // Every ply must be a four-character `<from><to>` pair; a row with a
    // truncated ply is unplayable and gets dropped with the other malformed
    // rows.
    if !moves
        .split_whitespace()
        .all(|ply| ply.len() == 4 && ply.is_ascii())
    {
        return None;
    }

    // Rating columns are optional for backward compatibility.
    let rating = fields.next().and_then(|v| v.trim().parse().ok());
    let rating_deviation = fields.next().and_then(|v| v.trim().parse().ok());

    Some(Puzzle {
        id: id.to_string(),
        fen: fen.to_string(),
        moves: moves.to_string(),
        rating,
        rating_deviation,
    })
}
