pub mod board;
pub mod deepening;
pub mod difficulty;
pub mod error;
pub mod evaluation;
pub mod movegen;
pub mod ordering;
pub mod position;
pub mod search;
pub mod selfplay;
pub mod transposition;
pub mod usi;

#[cfg(test)]
mod test_tree;

pub use deepening::SearchResult;
pub use difficulty::{Difficulty, DifficultyProfile};
pub use error::{ConfigError, ParseError, SearchError};
pub use position::Position;
pub use search::SearchEngine;

#[cfg(test)]
mod tests {
    use super::*;
    use board::{square, Board, Color, Piece};
    use movegen::{GameState, Move, MoveGenerator};

    fn perft(board: &mut Board, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let mut nodes = 0;
        for mv in board.legal_moves() {
            board.push(mv);
            nodes += perft(board, depth - 1);
            board.pop();
        }
        nodes
    }

    fn play(board: &mut Board, moves: &[&str]) {
        let generator = MoveGenerator::new();
        for text in moves {
            let mv = generator.parse_usi(board, text).unwrap();
            board.make_move(mv);
        }
    }

    #[test]
    fn test_initial_position() {
        let board = Board::new();
        let generator = MoveGenerator::new();
        let moves = generator.generate_moves(&board);

        // Black has 30 legal moves in the initial position
        assert_eq!(moves.len(), 30);
        for mv in moves {
            assert!(generator.is_move_valid(&board, &mv));
        }
        assert_eq!(generator.get_game_state(&board), GameState::Ongoing);
    }

    #[test]
    fn test_perft() {
        let mut board = Board::new();
        let before = board.clone();
        assert_eq!(perft(&mut board, 1), 30);
        assert_eq!(perft(&mut board, 2), 900);
        assert_eq!(perft(&mut board, 3), 25470);
        assert_eq!(board, before);
    }

    #[test]
    fn test_push_pop_every_move() {
        let mut board = Board::new();
        play(&mut board, &["7g7f", "3c3d", "8h2b+", "3a2b"]);
        let before = board.clone();
        for mv in board.legal_moves() {
            board.push(mv);
            assert_eq!(board.pop(), Some(mv));
            assert_eq!(board, before);
        }
        assert_eq!(board.hand_count(Color::Black, Piece::Bishop), 1);
        assert_eq!(board.hand_count(Color::White, Piece::Bishop), 1);
    }

    #[test]
    fn test_forced_promotion() {
        let board = Board::from_sfen("k8/4P4/9/9/9/9/9/9/4K4 b - 1").unwrap();
        let moves: Vec<String> = MoveGenerator::new()
            .generate_moves(&board)
            .iter()
            .filter(|mv| mv.piece() == Piece::Pawn)
            .map(|mv| mv.to_string())
            .collect();
        assert_eq!(moves, vec!["5b5a+"]);
    }

    #[test]
    fn test_optional_promotion() {
        let board = Board::from_sfen("k8/9/9/4P4/9/9/9/9/4K4 b - 1").unwrap();
        let moves: Vec<String> = MoveGenerator::new()
            .generate_moves(&board)
            .iter()
            .filter(|mv| mv.piece() == Piece::Pawn)
            .map(|mv| mv.to_string())
            .collect();
        assert_eq!(moves, vec!["5d5c+", "5d5c"]);
    }

    #[test]
    fn test_pawn_drops_skip_files_with_pawns() {
        let board = Board::from_sfen("4k4/9/9/9/9/9/4P4/9/4K4 b P 1").unwrap();
        let drops: Vec<Move> = MoveGenerator::new()
            .generate_moves(&board)
            .into_iter()
            .filter(|mv| mv.is_drop())
            .collect();

        assert_eq!(drops.len(), 64);
        assert!(drops.iter().all(|mv| board::file_of(mv.to()) != 5));
        assert!(drops.iter().all(|mv| board::rank_of(mv.to()) != 0));
    }

    #[test]
    fn test_knight_drops_avoid_last_two_ranks() {
        let board = Board::from_sfen("4k4/9/9/9/9/9/9/9/4K4 b N 1").unwrap();
        let drops: Vec<Move> = MoveGenerator::new()
            .generate_moves(&board)
            .into_iter()
            .filter(|mv| mv.is_drop())
            .collect();

        assert_eq!(drops.len(), 62);
        assert!(drops.iter().all(|mv| board::rank_of(mv.to()) >= 2));
    }

    #[test]
    fn test_pawn_drop_mate_is_illegal() {
        let board = Board::from_sfen("8k/9/6NG1/9/9/9/9/9/K8 b P 1").unwrap();
        let generator = MoveGenerator::new();
        let moves = generator.generate_moves(&board);

        let mate_drop = Move::Drop {
            piece: Piece::Pawn,
            to: square(1, 1),
        };
        let quiet_drop = Move::Drop {
            piece: Piece::Pawn,
            to: square(1, 3),
        };
        assert!(!moves.contains(&mate_drop));
        assert!(moves.contains(&quiet_drop));
        assert!(generator.parse_usi(&board, "P*1b").is_err());
    }

    #[test]
    fn test_check() {
        let generator = MoveGenerator::new();

        let board = Board::from_sfen("4k4/9/9/9/4R4/9/9/9/4K4 w - 1").unwrap();
        assert!(generator.is_king_in_check(&board, Color::White));
        assert!(board.is_check());

        let blocked = Board::from_sfen("4k4/9/4p4/9/4R4/9/9/9/4K4 w - 1").unwrap();
        assert!(!generator.is_king_in_check(&blocked, Color::White));

        let knight = Board::from_sfen("4k4/9/9/9/9/9/5n3/9/4K4 b - 1").unwrap();
        assert!(generator.is_king_in_check(&knight, Color::Black));
        assert!(generator.is_square_under_attack(&knight, square(3, 8), Color::White));
    }

    #[test]
    fn test_checkmate() {
        let board = Board::from_sfen("8k/8G/8P/9/9/9/9/9/K8 w - 1").unwrap();
        let generator = MoveGenerator::new();
        assert!(generator.generate_moves(&board).is_empty());
        assert_eq!(
            generator.get_game_state(&board),
            GameState::Checkmate(Color::Black)
        );
        assert!(board.is_game_over());
    }

    #[test]
    fn test_stalemate() {
        let board = Board::from_sfen("8k/6G2/8P/9/9/9/9/9/K8 w - 1").unwrap();
        let generator = MoveGenerator::new();
        assert!(!generator.is_king_in_check(&board, Color::White));
        assert_eq!(generator.get_game_state(&board), GameState::Stalemate);
    }

    #[test]
    fn test_repetition() {
        let generator = MoveGenerator::new();
        let mut board = Board::from_sfen("4k4/9/9/9/9/9/9/9/4K4 b - 1").unwrap();
        let cycle = ["5i5h", "5a5b", "5h5i", "5b5a"];

        play(&mut board, &cycle);
        play(&mut board, &cycle);
        assert_eq!(board.repetition_count(), 2);
        assert_eq!(generator.get_game_state(&board), GameState::Ongoing);

        play(&mut board, &cycle);
        assert_eq!(generator.get_game_state(&board), GameState::Repetition);
        assert!(board.is_game_over());
        assert_eq!(evaluation::Evaluator::new().evaluate(&board), 0);
    }
}
