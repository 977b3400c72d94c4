//! Synthetic game trees for exercising the search without shogi rules.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::board::{Color, Piece};
use crate::evaluation::{Evaluate, MATE_SCORE};
use crate::movegen::Move;
use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub children: Vec<usize>,
    /// Static score for the side to move here.
    pub score: i32,
    /// Only meaningful for nodes without children: mated rather than stalemated.
    pub in_check: bool,
}

impl Node {
    pub fn inner(children: Vec<usize>, score: i32) -> Self {
        Self {
            children,
            score,
            in_check: false,
        }
    }

    pub fn mated() -> Self {
        Self {
            children: Vec::new(),
            score: 0,
            in_check: true,
        }
    }

    pub fn leaf() -> Self {
        Self::inner(Vec::new(), 0)
    }
}

/// A walk through a layered DAG. Every node lives on exactly one level, so the
/// side to move is a function of the node alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePosition {
    nodes: Vec<Node>,
    path: Vec<usize>,
}

impl TreePosition {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            path: vec![0],
        }
    }

    /// Root plus `levels` levels of `width` nodes. Edges only go one level
    /// down and may share children, which gives the table transpositions.
    pub fn random(seed: u64, levels: usize, width: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let level_start = |level: usize| if level == 0 { 0 } else { 1 + (level - 1) * width };

        let mut nodes = Vec::new();
        for level in 0..=levels {
            let count = if level == 0 { 1 } else { width };
            for _ in 0..count {
                let branching = if level == levels || rng.gen_bool(0.15) {
                    0
                } else {
                    rng.gen_range(1..=4)
                };
                let next = level_start(level + 1);
                let mut children: Vec<usize> = (next..next + width).collect();
                children.shuffle(&mut rng);
                children.truncate(branching);

                let in_check = children.is_empty() && rng.gen_bool(0.4);
                nodes.push(Node {
                    children,
                    score: rng.gen_range(-500..=500),
                    in_check,
                });
            }
        }
        Self::new(nodes)
    }

    fn current(&self) -> &Node {
        &self.nodes[self.current_id()]
    }

    fn current_id(&self) -> usize {
        self.path.last().copied().unwrap_or(0)
    }
}

fn child_move(index: usize) -> Move {
    Move::Drop {
        piece: Piece::Pawn,
        to: index as u8,
    }
}

impl Position for TreePosition {
    fn side_to_move(&self) -> Color {
        if self.path.len() % 2 == 1 {
            Color::Black
        } else {
            Color::White
        }
    }

    fn legal_moves(&self) -> Vec<Move> {
        (0..self.current().children.len()).map(child_move).collect()
    }

    fn push(&mut self, mv: Move) {
        let child = self.current().children[mv.to() as usize];
        self.path.push(child);
    }

    fn pop(&mut self) -> Option<Move> {
        if self.path.len() <= 1 {
            return None;
        }
        let child = self.path.pop()?;
        let index = self.current().children.iter().position(|&c| c == child)?;
        Some(child_move(index))
    }

    fn is_check(&self) -> bool {
        self.current().in_check
    }

    fn is_game_over(&self) -> bool {
        self.current().children.is_empty()
    }

    fn key(&self) -> u64 {
        (self.current_id() as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15)
    }
}

pub struct TreeEvaluator;

impl Evaluate<TreePosition> for TreeEvaluator {
    fn evaluate(&self, position: &TreePosition) -> i32 {
        let node = position.current();
        match (node.children.is_empty(), node.in_check) {
            (true, true) => -MATE_SCORE,
            (true, false) => 0,
            (false, _) => node.score,
        }
    }
}

/// Plain minimax with the same leaf scoring as the engine.
pub fn minimax(position: &mut TreePosition, depth: u32, maximizing: bool) -> i32 {
    if depth == 0 || position.is_game_over() {
        let mut score = TreeEvaluator.evaluate(position);
        if score <= -MATE_SCORE {
            score = -(MATE_SCORE + depth as i32);
        }
        return if maximizing { score } else { -score };
    }

    let mut scores = Vec::new();
    for mv in position.legal_moves() {
        position.push(mv);
        scores.push(minimax(position, depth - 1, !maximizing));
        position.pop();
    }
    let best = if maximizing {
        scores.into_iter().max()
    } else {
        scores.into_iter().min()
    };
    best.unwrap_or(0)
}
