use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};

use crate::difficulty::DifficultyProfile;
use crate::error::SearchError;
use crate::evaluation::{Evaluate, MATE_SCORE};
use crate::movegen::Move;
use crate::position::Position;
use crate::search::{SearchEngine, INFINITY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Move,
    /// From the point of view of the side to move at the root.
    pub score: i32,
    /// Deepest iteration that finished; 0 when even depth 1 was cut short.
    pub depth_reached: u32,
    pub nodes_visited: u64,
    pub elapsed: Duration,
}

impl SearchResult {
    pub fn is_mate(&self) -> bool {
        self.score.abs() >= MATE_SCORE
    }
}

impl<E> SearchEngine<E> {
    /// Searches depth 1, 2, ... up to the profile's depth until the time
    /// budget runs out, keeping the result of the deepest completed iteration.
    ///
    /// Always answers with a legal move when one exists, however small the
    /// budget. A lone legal move is played without searching. The position is
    /// left exactly as it was given.
    pub fn find_best_move<P>(
        &mut self,
        position: &mut P,
        profile: &DifficultyProfile,
    ) -> Result<SearchResult, SearchError>
    where
        P: Position,
        E: Evaluate<P>,
    {
        let start = Instant::now();

        let mut root_moves = position.legal_moves();
        self.orderer().order(&mut root_moves);
        let Some(&first_move) = root_moves.first() else {
            return Err(SearchError::NoLegalMoves);
        };

        if root_moves.len() == 1 {
            debug!("{first_move} is the only legal move");
            return Ok(SearchResult {
                best_move: first_move,
                score: 0,
                depth_reached: 0,
                nodes_visited: 0,
                elapsed: start.elapsed(),
            });
        }

        self.begin(start.checked_add(profile.time_budget()));

        let mut best: Option<(i32, Move)> = None;
        let mut depth_reached = 0;

        for depth in 1..=profile.max_depth() {
            if depth > 1 && start.elapsed() >= profile.time_budget() {
                debug!("time budget spent before depth {depth}");
                break;
            }

            let (score, best_move) = self.search(position, depth, -INFINITY, INFINITY, true);

            if self.is_aborted() {
                if depth == 1 {
                    best = self.take_root_best();
                }
                debug!("depth {depth} interrupted after {} nodes", self.get_nodes_searched());
                break;
            }
            self.take_root_best();

            let Some(best_move) = best_move else {
                break;
            };
            best = Some((score, best_move));
            depth_reached = depth;

            debug!(
                "depth {depth} score {score} nodes {} time {:?} move {best_move}",
                self.get_nodes_searched(),
                start.elapsed()
            );

            if score.abs() >= MATE_SCORE {
                debug!("mate found at depth {depth}");
                break;
            }
        }

        self.finish();

        let table = self.transposition_table();
        trace!(
            "table entries {} hits {} misses {}",
            table.len(),
            table.hits(),
            table.misses()
        );

        let (score, best_move) = best.unwrap_or_else(|| {
            warn!("no iteration completed in {:?}, playing {first_move}", profile.time_budget());
            (0, first_move)
        });

        let result = SearchResult {
            best_move,
            score,
            depth_reached,
            nodes_visited: self.get_nodes_searched(),
            elapsed: start.elapsed(),
        };
        info!(
            "best move {} score {} depth {} nodes {} time {:?}",
            result.best_move,
            result.score,
            result.depth_reached,
            result.nodes_visited,
            result.elapsed
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{square, Board, Piece};
    use crate::difficulty::Difficulty;
    use crate::movegen::MoveGenerator;
    use crate::test_tree::{Node, TreeEvaluator, TreePosition};

    fn profile(depth: u32) -> DifficultyProfile {
        DifficultyProfile::new(depth, Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn test_finds_drop_mate() {
        let mut board = Board::from_sfen("8k/9/8P/9/9/9/9/9/K8 b G 1").unwrap();
        let mut engine = SearchEngine::new();
        let result = engine.find_best_move(&mut board, &Difficulty::Easy.profile()).unwrap();
        assert_eq!(
            result.best_move,
            Move::Drop {
                piece: Piece::Gold,
                to: square(1, 1),
            }
        );
        assert_eq!(result.best_move.to_string(), "G*1b");
        assert!(result.is_mate());
        assert_eq!(result.depth_reached, 1);
    }

    #[test]
    fn test_captures_hanging_rook() {
        let mut board = Board::from_sfen("4k4/9/9/9/4r4/9/9/4R4/4K4 b - 1").unwrap();
        let mut engine = SearchEngine::new();
        let result = engine.find_best_move(&mut board, &profile(2)).unwrap();
        assert_eq!(result.best_move.to_string(), "5h5e");
        assert_eq!(result.depth_reached, 2);
    }

    #[test]
    fn test_no_legal_moves_is_an_error() {
        let mut board = Board::from_sfen("8k/8G/8P/9/9/9/9/9/K8 w - 1").unwrap();
        let mut engine = SearchEngine::new();
        assert_eq!(
            engine.find_best_move(&mut board, &profile(3)),
            Err(SearchError::NoLegalMoves)
        );
    }

    #[test]
    fn test_tiny_budget_still_returns_legal_move() {
        let generator = MoveGenerator::new();
        let mut board = Board::new();
        let before = board.clone();
        let tight = DifficultyProfile::new(5, Duration::from_nanos(1)).unwrap();

        let mut engine = SearchEngine::new();
        let result = engine.find_best_move(&mut board, &tight).unwrap();
        assert!(generator.is_move_valid(&board, &result.best_move));
        assert_eq!(board, before);
    }

    #[test]
    fn test_interrupted_search_restores_position() {
        let mut board = Board::new();
        let before = board.clone();
        let profile = DifficultyProfile::new(6, Duration::from_millis(30)).unwrap();
        let mut engine = SearchEngine::new();
        let result = engine.find_best_move(&mut board, &profile).unwrap();
        assert!(result.depth_reached < 6);
        assert_eq!(board, before);
    }

    #[test]
    fn test_search_is_deterministic() {
        let generator = MoveGenerator::new();
        let mut board = Board::new();
        for text in ["7g7f", "3c3d", "2g2f"] {
            let mv = generator.parse_usi(&board, text).unwrap();
            board.make_move(mv);
        }

        let first = SearchEngine::new().find_best_move(&mut board, &profile(2)).unwrap();
        let second = SearchEngine::new().find_best_move(&mut board, &profile(2)).unwrap();
        assert_eq!(first.best_move, second.best_move);
        assert_eq!(first.score, second.score);
        assert_eq!(first.nodes_visited, second.nodes_visited);
    }

    #[test]
    fn test_stops_once_mate_is_proven() {
        // Move 1 mates immediately; deeper iterations would add nothing.
        let mut tree = TreePosition::new(vec![
            Node::inner(vec![1, 2], 0),
            Node::inner(vec![3], 50),
            Node::mated(),
            Node::inner(vec![4], 0),
            Node::leaf(),
        ]);
        let mut engine = SearchEngine::with_evaluator(TreeEvaluator);
        let result = engine.find_best_move(&mut tree, &profile(4)).unwrap();
        assert_eq!(result.best_move.to(), 1);
        assert_eq!(result.score, MATE_SCORE);
        assert_eq!(result.depth_reached, 1);
    }

    #[test]
    fn test_only_move_is_played_without_search() {
        let mut tree = TreePosition::new(vec![
            Node::inner(vec![1], 0),
            Node::inner(vec![2, 3], 0),
            Node::mated(),
            Node::leaf(),
        ]);
        let mut engine = SearchEngine::with_evaluator(TreeEvaluator);
        let result = engine.find_best_move(&mut tree, &profile(4)).unwrap();
        assert_eq!(result.best_move.to(), 0);
        assert_eq!(result.depth_reached, 0);
        assert_eq!(result.nodes_visited, 0);
        assert_eq!(result.score, 0);
        assert!(engine.transposition_table().is_empty());
    }

    #[test]
    fn test_king_with_one_escape_moves_at_once() {
        let mut board = Board::from_sfen("k8/9/1R7/9/9/9/9/9/8K w - 1").unwrap();
        let legal = board.legal_moves();
        assert_eq!(legal.len(), 1);

        let mut engine = SearchEngine::new();
        let result = engine.find_best_move(&mut board, &profile(3)).unwrap();
        assert_eq!(result.best_move, legal[0]);
        assert_eq!(result.depth_reached, 0);
    }

    #[test]
    fn test_tree_fallback_is_first_ordered_move() {
        let mut tree = TreePosition::random(3, 6, 10);
        let tight = DifficultyProfile::new(5, Duration::from_nanos(1)).unwrap();
        let mut engine = SearchEngine::with_evaluator(TreeEvaluator);
        match engine.find_best_move(&mut tree, &tight) {
            Ok(result) => assert!((result.best_move.to() as usize) < tree.legal_moves().len()),
            Err(err) => {
                assert_eq!(err, SearchError::NoLegalMoves);
                assert!(tree.legal_moves().is_empty());
            }
        }
    }

    #[test]
    fn test_engine_reuse_across_searches() {
        let mut board = Board::from_sfen("4k4/9/9/9/4r4/9/9/4R4/4K4 b - 1").unwrap();
        let mut engine = SearchEngine::new();
        let first = engine.find_best_move(&mut board, &profile(2)).unwrap();
        let second = engine.find_best_move(&mut board, &profile(2)).unwrap();
        assert_eq!(first.best_move, second.best_move);
        engine.new_game();
        assert!(engine.transposition_table().is_empty());
    }
}
