use std::ops::{Deref, DerefMut};
use std::time::Instant;

use crate::evaluation::{Evaluate, Evaluator, MATE_SCORE};
use crate::movegen::Move;
use crate::ordering::MoveOrderer;
use crate::position::Position;
use crate::transposition::{NodeType, TranspositionEntry, TranspositionTable};

/// Wider than any score the search can produce, mate scores included.
pub const INFINITY: i32 = 10_000_000;

pub const DEFAULT_TABLE_SIZE: usize = 1_000_000;

/// A move played on a position for as long as the guard lives.
struct Played<'a, P: Position> {
    position: &'a mut P,
}

impl<'a, P: Position> Played<'a, P> {
    fn new(position: &'a mut P, mv: Move) -> Self {
        position.push(mv);
        Self { position }
    }
}

impl<P: Position> Deref for Played<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.position
    }
}

impl<P: Position> DerefMut for Played<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.position
    }
}

impl<P: Position> Drop for Played<'_, P> {
    fn drop(&mut self) {
        self.position.pop();
    }
}

/// Depth-limited minimax with alpha-beta pruning and a transposition table.
///
/// Scores returned by [`SearchEngine::search`] are from the root side's point
/// of view: the maximizing side is whoever was to move at the root.
pub struct SearchEngine<E = Evaluator> {
    evaluator: E,
    orderer: MoveOrderer,
    transposition_table: TranspositionTable,
    nodes_searched: u64,
    deadline: Option<Instant>,
    aborted: bool,
    ply: u32,
    /// Best fully searched root move of the running iteration.
    root_best: Option<(i32, Move)>,
}

impl Default for SearchEngine<Evaluator> {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEngine<Evaluator> {
    pub fn new() -> Self {
        let evaluator = Evaluator::new();
        let orderer = MoveOrderer::new(evaluator.weights());
        Self::with_parts(evaluator, orderer)
    }
}

impl<E> SearchEngine<E> {
    /// Engine around a custom evaluator, ordering moves by the default weights.
    pub fn with_evaluator(evaluator: E) -> Self {
        Self::with_parts(evaluator, MoveOrderer::default())
    }

    pub fn with_parts(evaluator: E, orderer: MoveOrderer) -> Self {
        Self {
            evaluator,
            orderer,
            transposition_table: TranspositionTable::new(DEFAULT_TABLE_SIZE),
            nodes_searched: 0,
            deadline: None,
            aborted: false,
            ply: 0,
            root_best: None,
        }
    }

    /// Replaces the transposition table; zero disables it.
    pub fn with_table_capacity(mut self, entries: usize) -> Self {
        self.set_table_capacity(entries);
        self
    }

    pub fn set_table_capacity(&mut self, entries: usize) {
        self.transposition_table = TranspositionTable::new(entries);
    }

    /// Forget everything learned from the previous game.
    pub fn new_game(&mut self) {
        self.transposition_table.clear();
    }

    pub fn transposition_table(&self) -> &TranspositionTable {
        &self.transposition_table
    }

    pub fn get_nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    pub(crate) fn orderer(&self) -> &MoveOrderer {
        &self.orderer
    }

    pub(crate) fn begin(&mut self, deadline: Option<Instant>) {
        self.nodes_searched = 0;
        self.deadline = deadline;
        self.aborted = false;
        self.ply = 0;
        self.root_best = None;
    }

    pub(crate) fn finish(&mut self) {
        self.deadline = None;
        self.aborted = false;
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub(crate) fn take_root_best(&mut self) -> Option<(i32, Move)> {
        self.root_best.take()
    }

    fn out_of_time(&mut self) -> bool {
        if !self.aborted {
            if let Some(deadline) = self.deadline {
                self.aborted = Instant::now() >= deadline;
            }
        }
        self.aborted
    }

    /// Searches `position` to `depth` plies and returns the score together
    /// with the best move found, if any move was searched to completion.
    ///
    /// When the deadline passes mid-search the result is meaningless and
    /// nothing from the interrupted subtree is stored.
    pub fn search<P>(
        &mut self,
        position: &mut P,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> (i32, Option<Move>)
    where
        P: Position,
        E: Evaluate<P>,
    {
        self.nodes_searched += 1;
        if self.out_of_time() {
            return (0, None);
        }

        if depth == 0 || position.is_game_over() {
            return (self.leaf_score(position, depth, maximizing), None);
        }

        let at_root = self.ply == 0;
        let hash = position.key();

        // Entries hold the side to move's view; a minimizing node sees the
        // window negated.
        if !at_root {
            let (lo, hi) = if maximizing {
                (alpha, beta)
            } else {
                (-beta, -alpha)
            };
            if let Some((score, best_move)) = self.transposition_table.probe(hash, depth, lo, hi) {
                let score = if maximizing { score } else { -score };
                return (score, best_move);
            }
        }

        let mut moves = position.legal_moves();
        if moves.is_empty() {
            return (self.leaf_score(position, depth, maximizing), None);
        }
        self.orderer.order(&mut moves);

        let (alpha_orig, beta_orig) = (alpha, beta);
        let mut best_score = if maximizing { -INFINITY } else { INFINITY };
        let mut best_move = None;

        for mv in moves {
            let score = {
                let mut child = Played::new(position, mv);
                self.ply += 1;
                let (score, _) = self.search(&mut *child, depth - 1, alpha, beta, !maximizing);
                self.ply -= 1;
                score
            };
            if self.aborted {
                return (0, None);
            }

            if maximizing {
                if score > best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
                alpha = alpha.max(best_score);
            } else {
                if score < best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
                beta = beta.min(best_score);
            }

            if at_root {
                self.root_best = best_move.map(|best| (best_score, best));
            }

            // Alpha-beta pruning
            if alpha >= beta {
                break;
            }
        }

        let node_type = if best_score <= alpha_orig {
            NodeType::UpperBound
        } else if best_score >= beta_orig {
            NodeType::LowerBound
        } else {
            NodeType::Exact
        };
        let (score, node_type) = if maximizing {
            (best_score, node_type)
        } else {
            (-best_score, node_type.flipped())
        };
        self.transposition_table.store(
            hash,
            TranspositionEntry {
                hash,
                depth,
                score,
                node_type,
                best_move,
            },
        );

        (best_score, best_move)
    }

    /// Static score of a leaf from the maximizing side's view. Mates found with
    /// more depth left are closer to the root and score further from zero.
    fn leaf_score<P>(&self, position: &P, depth: u32, maximizing: bool) -> i32
    where
        P: Position,
        E: Evaluate<P>,
    {
        let mut score = self.evaluator.evaluate(position);
        if score <= -MATE_SCORE {
            score = -(MATE_SCORE + depth as i32);
        }
        if maximizing {
            score
        } else {
            -score
        }
    }
}
