use log::{info, warn};

use crate::board::{Board, Color};
use crate::difficulty::{Difficulty, DifficultyProfile};
use crate::movegen::{GameState, Move, MoveGenerator};
use crate::search::SearchEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub moves: Vec<Move>,
    /// `Ongoing` when the ply limit was reached first.
    pub outcome: GameState,
    pub final_sfen: String,
}

/// Plays a game from the initial position between two engines.
pub fn play(black: Difficulty, white: Difficulty, max_plies: usize) -> GameRecord {
    play_from(Board::new(), &black.profile(), &white.profile(), max_plies)
}

/// Each side owns its engine and transposition table; nothing is shared.
pub fn play_from(
    mut board: Board,
    black: &DifficultyProfile,
    white: &DifficultyProfile,
    max_plies: usize,
) -> GameRecord {
    let generator = MoveGenerator::new();
    let mut engines = [SearchEngine::new(), SearchEngine::new()];
    let mut moves = Vec::new();

    for _ in 0..max_plies {
        if generator.get_game_state(&board) != GameState::Ongoing {
            break;
        }

        let side = board.side_to_move();
        let profile = match side {
            Color::Black => black,
            Color::White => white,
        };

        match engines[side.index()].find_best_move(&mut board, profile) {
            Ok(result) => {
                info!(
                    "{} {:?} plays {} (score {}, depth {})",
                    board.move_number(),
                    side,
                    result.best_move,
                    result.score,
                    result.depth_reached
                );
                board.make_move(result.best_move);
                moves.push(result.best_move);
            }
            Err(err) => {
                warn!("{side:?} cannot move: {err}");
                break;
            }
        }
    }

    GameRecord {
        moves,
        outcome: generator.get_game_state(&board),
        final_sfen: board.to_sfen(),
    }
}
