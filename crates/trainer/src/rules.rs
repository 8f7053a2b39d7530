//! Chess rules collaborator.
//!
//! The session machine never touches a rules library directly; it receives a
//! [`Rules`] capability at construction time. [`BoardRules`] is the stock
//! implementation over the `chess` crate.

use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, Color, File, MoveGen, Piece, Rank, Square};

use crate::error::TrainerError;

/// The side to move, decoupled from any particular rules library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

/// Move-legality capability the session machine depends on.
pub trait Rules: Send {
    /// Reset to the position described by `fen`.
    fn set_position(&mut self, fen: &str) -> Result<(), TrainerError>;

    fn side_to_move(&self) -> Side;

    /// Apply a `<from><to>` ply if legal. Pawn moves to the last rank
    /// promote to a queen. Returns false (and leaves the position
    /// untouched) for illegal moves.
    fn apply(&mut self, from: &str, to: &str) -> bool;

    /// Revert the most recent applied move, if any.
    fn undo(&mut self);

    fn in_check(&self) -> bool;

    /// Checkmate, stalemate, or draw.
    fn is_game_over(&self) -> bool;

    fn fen(&self) -> String;
}

/// `Rules` over the `chess` crate. The crate's boards are immutable values,
/// so undo is a history stack rather than a move take-back.
pub struct BoardRules {
    history: Vec<Board>,
}

impl BoardRules {
    pub fn new(fen: &str) -> Result<Self, TrainerError> {
        let board = parse_fen(fen)?;
        Ok(Self {
            history: vec![board],
        })
    }

    fn board(&self) -> &Board {
        // The history always holds at least the starting position.
        self.history.last().unwrap_or_else(|| unreachable!())
    }

    /// Find the legal move matching `from`/`to`, preferring queen promotion
    /// when several promotions match.
    fn find_move(&self, from: Square, to: Square) -> Option<ChessMove> {
        let candidates: Vec<ChessMove> = MoveGen::new_legal(self.board())
            .filter(|m| m.get_source() == from && m.get_dest() == to)
            .collect();

        match candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            // Several candidates means promotion variants; auto-queen.
            many => many
                .iter()
                .copied()
                .find(|m| m.get_promotion() == Some(Piece::Queen)),
        }
    }
}

impl Rules for BoardRules {
    fn set_position(&mut self, fen: &str) -> Result<(), TrainerError> {
        self.history = vec![parse_fen(fen)?];
        Ok(())
    }

    fn side_to_move(&self) -> Side {
        match self.board().side_to_move() {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }

    fn apply(&mut self, from: &str, to: &str) -> bool {
        let (Some(from), Some(to)) = (parse_square(from), parse_square(to)) else {
            return false;
        };
        let Some(mv) = self.find_move(from, to) else {
            return false;
        };

        let next = self.board().make_move_new(mv);
        self.history.push(next);
        true
    }

    fn undo(&mut self) {
        if self.history.len() > 1 {
            self.history.pop();
        }
    }

    fn in_check(&self) -> bool {
        self.board().checkers().popcnt() > 0
    }

    fn is_game_over(&self) -> bool {
        self.board().status() != BoardStatus::Ongoing
    }

    fn fen(&self) -> String {
        self.board().to_string()
    }
}

fn parse_fen(fen: &str) -> Result<Board, TrainerError> {
    Board::from_str(fen).map_err(|_| TrainerError::InvalidFen(fen.to_string()))
}

fn parse_square(square: &str) -> Option<Square> {
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let file = (bytes[0] as char).to_ascii_lowercase() as usize;
    let rank = bytes[1] as usize;
    if !(b'a' as usize..=b'h' as usize).contains(&file) || !(b'1' as usize..=b'8' as usize).contains(&rank) {
        return None;
    }

    Some(Square::make_square(
        Rank::from_index(rank - b'1' as usize),
        File::from_index(file - b'a' as usize),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_apply_legal_move_switches_side() {
        let mut rules = BoardRules::new(START_FEN).unwrap();
        assert_eq!(rules.side_to_move(), Side::White);
        assert!(rules.apply("e2", "e4"));
        assert_eq!(rules.side_to_move(), Side::Black);
    }

    #[test]
    fn test_illegal_move_is_rejected_without_mutation() {
        let mut rules = BoardRules::new(START_FEN).unwrap();
        let before = rules.fen();
        assert!(!rules.apply("e2", "e5"));
        assert!(!rules.apply("e7", "e5")); // wrong side
        assert!(!rules.apply("zz", "e4")); // not a square
        assert_eq!(rules.fen(), before);
    }

    #[test]
    fn test_undo_restores_previous_position() {
        let mut rules = BoardRules::new(START_FEN).unwrap();
        let before = rules.fen();
        rules.apply("e2", "e4");
        rules.undo();
        assert_eq!(rules.fen(), before);

        // Undo at the root is a no-op.
        rules.undo();
        assert_eq!(rules.fen(), before);
    }

    #[test]
    fn test_pawn_auto_promotes_to_queen() {
        // White pawn on a7, kings far apart.
        let mut rules = BoardRules::new("8/P7/8/8/8/k7/8/K7 w - - 0 1").unwrap();
        assert!(rules.apply("a7", "a8"));
        assert!(rules.fen().starts_with("Q7/8"));
    }

    #[test]
    fn test_checkmate_is_game_over() {
        // Fool's mate position after Qh4#.
        let rules =
            BoardRules::new("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert!(rules.in_check());
        assert!(rules.is_game_over());
    }

    #[test]
    fn test_invalid_fen_is_an_error() {
        assert!(BoardRules::new("definitely not a fen").is_err());
    }
}
