use crate::evaluation::EvaluationWeights;
use crate::movegen::Move;

/// Sorts moves so the likeliest refutations are searched first: captures by
/// victim value, then promotions, then drops near the center, then the rest.
/// Ties keep generator order.
#[derive(Debug, Clone)]
pub struct MoveOrderer {
    victim_values: [i32; 14],
}

impl Default for MoveOrderer {
    fn default() -> Self {
        Self::new(&EvaluationWeights::default())
    }
}

impl MoveOrderer {
    pub fn new(weights: &EvaluationWeights) -> Self {
        Self {
            victim_values: weights.material,
        }
    }

    pub fn order(&self, moves: &mut [Move]) {
        // sort_by_key is stable.
        moves.sort_by_key(|mv| self.sort_key(mv));
    }

    fn sort_key(&self, mv: &Move) -> (u8, i32) {
        if let Some(victim) = mv.captured_piece() {
            return (0, -self.victim_values[victim.index()]);
        }
        if mv.is_promotion() {
            return (1, 0);
        }
        if mv.is_drop() && is_near_center(mv.to()) {
            return (2, 0);
        }
        (3, 0)
    }
}

/// The central 3x3 block plus its ring of neighbours.
fn is_near_center(square: u8) -> bool {
    let (col, row) = (square % 9, square / 9);
    (2..=6).contains(&col) && (2..=6).contains(&row)
}
