use crate::board::{Board, Color, Piece, NUM_SQUARES};
use crate::movegen::{GameState, MoveGenerator};

/// Score of a position whose side to move has been checkmated, negated.
pub const MATE_SCORE: i32 = 1_000_000;

/// Static scoring of a leaf position, always from the side to move's point of
/// view. Must be pure: equal positions get equal scores.
pub trait Evaluate<P: ?Sized> {
    /// Returns `-MATE_SCORE` when the side to move is checkmated and 0 for drawn
    /// terminal positions.
    fn evaluate(&self, position: &P) -> i32;
}

// Positional tables are laid out from the owner's side: row 0 is the far rank,
// row 8 the owner's back rank. White reads them rotated by 180 degrees.

const PAWN_TABLE: [[i32; 9]; 9] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [20, 20, 20, 24, 24, 24, 20, 20, 20],
    [16, 16, 18, 20, 20, 20, 18, 16, 16],
    [10, 10, 12, 14, 14, 14, 12, 10, 10],
    [6, 6, 8, 10, 10, 10, 8, 6, 6],
    [2, 2, 4, 6, 6, 6, 4, 2, 2],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

const LANCE_TABLE: [[i32; 9]; 9] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [6, 4, 4, 4, 4, 4, 4, 4, 6],
    [4, 2, 2, 2, 2, 2, 2, 2, 4],
    [2, 0, 0, 0, 0, 0, 0, 0, 2],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [2, 0, 0, 0, 0, 0, 0, 0, 2],
    [4, 0, 0, 0, 0, 0, 0, 0, 4],
];

const KNIGHT_TABLE: [[i32; 9]; 9] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [6, 10, 12, 14, 14, 14, 12, 10, 6],
    [4, 8, 10, 12, 12, 12, 10, 8, 4],
    [2, 6, 8, 10, 10, 10, 8, 6, 2],
    [0, 4, 6, 8, 8, 8, 6, 4, 0],
    [-2, 2, 4, 4, 4, 4, 4, 2, -2],
    [-4, 0, 0, 0, 0, 0, 0, 0, -4],
    [-4, 0, -2, 0, 0, 0, -2, 0, -4],
];

const SILVER_TABLE: [[i32; 9]; 9] = [
    [2, 4, 6, 6, 6, 6, 6, 4, 2],
    [4, 8, 10, 10, 10, 10, 10, 8, 4],
    [6, 10, 12, 12, 12, 12, 12, 10, 6],
    [4, 8, 10, 12, 12, 12, 10, 8, 4],
    [2, 6, 8, 10, 10, 10, 8, 6, 2],
    [0, 4, 6, 8, 8, 8, 6, 4, 0],
    [0, 2, 4, 6, 6, 6, 4, 2, 0],
    [-2, 0, 2, 4, 4, 4, 2, 0, -2],
    [-4, -2, 0, 0, 0, 0, 0, -2, -4],
];

const GOLD_TABLE: [[i32; 9]; 9] = [
    [4, 6, 8, 8, 8, 8, 8, 6, 4],
    [4, 6, 8, 8, 8, 8, 8, 6, 4],
    [2, 4, 6, 6, 6, 6, 6, 4, 2],
    [0, 2, 4, 4, 4, 4, 4, 2, 0],
    [0, 2, 2, 2, 2, 2, 2, 2, 0],
    [0, 2, 4, 4, 4, 4, 4, 2, 0],
    [2, 4, 6, 8, 8, 8, 6, 4, 2],
    [2, 6, 10, 12, 12, 12, 10, 6, 2],
    [0, 4, 8, 10, 10, 10, 8, 4, 0],
];

const BISHOP_TABLE: [[i32; 9]; 9] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 10, 0, 0, 0, 0, 0, 10, 0],
    [0, 0, 20, 0, 0, 0, 20, 0, 0],
    [0, 0, 0, 30, 0, 30, 0, 0, 0],
    [0, 0, 0, 0, 40, 0, 0, 0, 0],
    [0, 0, 0, 30, 0, 30, 0, 0, 0],
    [0, 0, 20, 0, 0, 0, 20, 0, 0],
    [0, 10, 0, 0, 0, 0, 0, 10, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

const ROOK_TABLE: [[i32; 9]; 9] = [
    [10, 10, 10, 10, 10, 10, 10, 10, 10],
    [16, 16, 16, 16, 16, 16, 16, 16, 16],
    [12, 12, 12, 12, 12, 12, 12, 12, 12],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [10, 10, 10, 10, 20, 10, 10, 10, 10],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
];

const KING_TABLE: [[i32; 9]; 9] = [
    [-60, -60, -60, -60, -60, -60, -60, -60, -60],
    [-50, -50, -50, -50, -50, -50, -50, -50, -50],
    [-40, -40, -40, -40, -40, -40, -40, -40, -40],
    [-30, -30, -30, -30, -30, -30, -30, -30, -30],
    [-20, -20, -20, -20, -20, -20, -20, -20, -20],
    [-10, -10, -10, -10, -10, -10, -10, -10, -10],
    [0, 0, -4, -8, -8, -8, -4, 0, 0],
    [10, 14, 8, 0, -4, 0, 8, 14, 10],
    [12, 16, 10, 4, 0, 4, 10, 16, 12],
];

/// 3x3 block in the middle of the board.
pub(crate) fn is_center_square(square: u8) -> bool {
    let (col, row) = (square % 9, square / 9);
    (3..=5).contains(&col) && (3..=5).contains(&row)
}

fn flatten(table: &[[i32; 9]; 9]) -> [i32; NUM_SQUARES] {
    let mut out = [0; NUM_SQUARES];
    for (row, values) in table.iter().enumerate() {
        out[row * 9..row * 9 + 9].copy_from_slice(values);
    }
    out
}

/// Hand-tuned weights. Material values follow the usual shogi ratios scaled to
/// a pawn of 100.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationWeights {
    /// Indexed by `Piece::index`.
    pub material: [i32; 14],
    /// Indexed by `Piece::index`, then by square as seen by Black.
    pub positional: [[i32; NUM_SQUARES]; 14],
    /// Penalty per empty or enemy-occupied square around a king.
    pub king_safety_weight: i32,
    pub center_control_bonus: i32,
    /// Value of a piece in hand as a percentage of its board value.
    pub hand_value_percent: i32,
}

impl Default for EvaluationWeights {
    fn default() -> Self {
        let pawn = flatten(&PAWN_TABLE);
        let lance = flatten(&LANCE_TABLE);
        let knight = flatten(&KNIGHT_TABLE);
        let silver = flatten(&SILVER_TABLE);
        let gold = flatten(&GOLD_TABLE);
        let bishop = flatten(&BISHOP_TABLE);
        let rook = flatten(&ROOK_TABLE);
        let king = flatten(&KING_TABLE);

        Self {
            // Pawn, Lance, Knight, Silver, Gold, Bishop, Rook, King,
            // +P, +L, +N, +S, Horse, Dragon
            material: [
                100, 300, 400, 500, 600, 800, 1000, 0, 1200, 1000, 1000, 1000, 1200, 1200,
            ],
            positional: [
                pawn, lance, knight, silver, gold, bishop, rook, king, gold, gold, gold, gold,
                bishop, rook,
            ],
            king_safety_weight: 15,
            center_control_bonus: 10,
            hand_value_percent: 50,
        }
    }
}

impl EvaluationWeights {
    pub fn piece_value(&self, piece: Piece) -> i32 {
        self.material[piece.index()]
    }

    pub fn hand_value(&self, piece: Piece) -> i32 {
        self.piece_value(piece) * self.hand_value_percent / 100
    }

    pub fn positional_value(&self, piece: Piece, square: u8, color: Color) -> i32 {
        let square = match color {
            Color::Black => square as usize,
            Color::White => NUM_SQUARES - 1 - square as usize,
        };
        self.positional[piece.index()][square]
    }
}

pub struct Evaluator {
    weights: EvaluationWeights,
    move_generator: MoveGenerator,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_weights(EvaluationWeights::default())
    }

    pub fn with_weights(weights: EvaluationWeights) -> Self {
        Self {
            weights,
            move_generator: MoveGenerator::new(),
        }
    }

    pub fn weights(&self) -> &EvaluationWeights {
        &self.weights
    }

    pub fn evaluate(&self, board: &Board) -> i32 {
        match self.move_generator.get_game_state(board) {
            GameState::Checkmate(_) => return -MATE_SCORE,
            GameState::Stalemate | GameState::Repetition => return 0,
            GameState::Ongoing => {}
        }

        // Positive favours Black until the final flip.
        let score = self.evaluate_pieces(board)
            + self.evaluate_hands(board)
            + self.evaluate_king_safety(board)
            + self.evaluate_center_control(board);

        match board.side_to_move() {
            Color::Black => score,
            Color::White => -score,
        }
    }

    fn evaluate_pieces(&self, board: &Board) -> i32 {
        let mut score = 0;
        for square in 0..NUM_SQUARES as u8 {
            if let Some((piece, color)) = board.get_piece_at(square) {
                let value = self.weights.piece_value(piece)
                    + self.weights.positional_value(piece, square, color);
                score += sign(color) * value;
            }
        }
        score
    }

    fn evaluate_hands(&self, board: &Board) -> i32 {
        let mut score = 0;
        for color in [Color::Black, Color::White] {
            for &piece in &Piece::HAND {
                let count = board.hand_count(color, piece) as i32;
                score += sign(color) * count * self.weights.hand_value(piece);
            }
        }
        score
    }

    fn evaluate_king_safety(&self, board: &Board) -> i32 {
        let black = self.king_exposure(board, Color::Black);
        let white = self.king_exposure(board, Color::White);
        (white - black) * self.weights.king_safety_weight
    }

    /// Neighbouring squares not covered by a friendly piece; the board edge counts as cover.
    fn king_exposure(&self, board: &Board, color: Color) -> i32 {
        let Some(king) = board.king_square(color) else {
            return 0;
        };
        let (col, row) = ((king % 9) as i8, (king / 9) as i8);

        let mut exposed = 0;
        for dr in -1..=1 {
            for dc in -1..=1 {
                let (c, r) = (col + dc, row + dr);
                if (dc, dr) == (0, 0) || !(0..9).contains(&c) || !(0..9).contains(&r) {
                    continue;
                }
                match board.get_piece_at((r * 9 + c) as u8) {
                    Some((_, owner)) if owner == color => {}
                    _ => exposed += 1,
                }
            }
        }
        exposed
    }

    fn evaluate_center_control(&self, board: &Board) -> i32 {
        let mut score = 0;
        for square in (0..NUM_SQUARES as u8).filter(|&sq| is_center_square(sq)) {
            if let Some((_, color)) = board.get_piece_at(square) {
                score += sign(color) * self.weights.center_control_bonus;
            }
        }
        score
    }
}

fn sign(color: Color) -> i32 {
    match color {
        Color::Black => 1,
        Color::White => -1,
    }
}

impl Evaluate<Board> for Evaluator {
    fn evaluate(&self, position: &Board) -> i32 {
        Evaluator::evaluate(self, position)
    }
}
