use crate::board::{Board, Color};
use crate::movegen::{Move, MoveGenerator, REPETITION_LIMIT};

/// What the search needs from a game position. Implementations enforce the
/// rules; the engine only walks the tree through this interface.
///
/// `push` and `pop` must be exact inverses: after `push(m)` followed by
/// `pop()`, the position compares equal to what it was before.
pub trait Position {
    fn side_to_move(&self) -> Color;

    /// Legal moves in generator order, without duplicates.
    fn legal_moves(&self) -> Vec<Move>;

    fn push(&mut self, mv: Move);

    fn pop(&mut self) -> Option<Move>;

    fn is_check(&self) -> bool;

    /// Checkmate, stalemate, or any rule-based draw.
    fn is_game_over(&self) -> bool;

    /// Fingerprint equal for equal positions.
    fn key(&self) -> u64;
}

impl Position for Board {
    fn side_to_move(&self) -> Color {
        Board::side_to_move(self)
    }

    fn legal_moves(&self) -> Vec<Move> {
        MoveGenerator::new().generate_moves(self)
    }

    fn push(&mut self, mv: Move) {
        self.make_move(mv);
    }

    fn pop(&mut self) -> Option<Move> {
        self.unmake_move()
    }

    fn is_check(&self) -> bool {
        MoveGenerator::new().is_king_in_check(self, Board::side_to_move(self))
    }

    fn is_game_over(&self) -> bool {
        self.repetition_count() >= REPETITION_LIMIT || !MoveGenerator::new().has_legal_move(self)
    }

    fn key(&self) -> u64 {
        self.hash()
    }
}
