use std::fmt;

use crate::board::{
    in_promotion_zone, relative_rank, square_name, Board, Color, Piece, NUM_SQUARES,
};
use crate::error::ParseError;

/// A move is either a board move or a drop from hand. Drops never promote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Board {
        from: u8,
        to: u8,
        piece: Piece,
        promotion: bool,
        captured: Option<Piece>,
    },
    Drop {
        piece: Piece,
        to: u8,
    },
}

impl Move {
    pub fn to(&self) -> u8 {
        match *self {
            Move::Board { to, .. } | Move::Drop { to, .. } => to,
        }
    }

    pub fn piece(&self) -> Piece {
        match *self {
            Move::Board { piece, .. } | Move::Drop { piece, .. } => piece,
        }
    }

    pub fn captured_piece(&self) -> Option<Piece> {
        match *self {
            Move::Board { captured, .. } => captured,
            Move::Drop { .. } => None,
        }
    }

    pub fn is_promotion(&self) -> bool {
        matches!(self, Move::Board { promotion: true, .. })
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, Move::Drop { .. })
    }
}

/// USI notation: `7g7f`, `8h2b+`, `P*5e`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Move::Board {
                from, to, promotion, ..
            } => {
                write!(f, "{}{}", square_name(from), square_name(to))?;
                if promotion {
                    write!(f, "+")?;
                }
                Ok(())
            }
            Move::Drop { piece, to } => {
                write!(f, "{}*{}", piece.to_sfen(Color::Black), square_name(to))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    /// The side that delivered mate.
    Checkmate(Color),
    Stalemate,
    Repetition,
}

/// Earlier occurrences after which the current position counts as a fourfold repetition.
pub const REPETITION_LIMIT: usize = 3;

type Squares = [Option<(Piece, Color)>; NUM_SQUARES];

// Directions are (column, rank) deltas from Black's point of view; rank -1 is forward.
const PAWN_STEPS: &[(i8, i8)] = &[(0, -1)];
const KNIGHT_STEPS: &[(i8, i8)] = &[(-1, -2), (1, -2)];
const SILVER_STEPS: &[(i8, i8)] = &[(-1, -1), (0, -1), (1, -1), (-1, 1), (1, 1)];
const GOLD_STEPS: &[(i8, i8)] = &[(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (0, 1)];
const KING_STEPS: &[(i8, i8)] = &[
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
const ORTHOGONAL: &[(i8, i8)] = &[(0, -1), (0, 1), (-1, 0), (1, 0)];
const DIAGONAL: &[(i8, i8)] = &[(-1, -1), (1, -1), (-1, 1), (1, 1)];

fn steps(piece: Piece) -> &'static [(i8, i8)] {
    match piece {
        Piece::Pawn => PAWN_STEPS,
        Piece::Knight => KNIGHT_STEPS,
        Piece::Silver => SILVER_STEPS,
        Piece::Gold | Piece::ProPawn | Piece::ProLance | Piece::ProKnight | Piece::ProSilver => {
            GOLD_STEPS
        }
        Piece::King => KING_STEPS,
        Piece::Horse => ORTHOGONAL,
        Piece::Dragon => DIAGONAL,
        Piece::Lance | Piece::Bishop | Piece::Rook => &[],
    }
}

fn slides(piece: Piece) -> &'static [(i8, i8)] {
    match piece {
        Piece::Lance => PAWN_STEPS,
        Piece::Bishop | Piece::Horse => DIAGONAL,
        Piece::Rook | Piece::Dragon => ORTHOGONAL,
        _ => &[],
    }
}

fn orient((dc, dr): (i8, i8), color: Color) -> (i8, i8) {
    match color {
        Color::Black => (dc, dr),
        Color::White => (-dc, -dr),
    }
}

fn offset(square: u8, dc: i8, dr: i8) -> Option<u8> {
    let col = (square % 9) as i8 + dc;
    let row = (square / 9) as i8 + dr;
    if (0..9).contains(&col) && (0..9).contains(&row) {
        Some((row * 9 + col) as u8)
    } else {
        None
    }
}

/// A piece standing here could never move again.
fn is_dead_square(piece: Piece, square: u8, color: Color) -> bool {
    let rank = relative_rank(square, color);
    match piece {
        Piece::Pawn | Piece::Lance => rank == 0,
        Piece::Knight => rank < 2,
        _ => false,
    }
}

fn is_attacked(squares: &Squares, target: u8, by: Color) -> bool {
    for &(dc, dr) in KING_STEPS {
        let toward_target = (-dc, -dr);
        let mut current = target;
        let mut distance = 0;
        while let Some(next) = offset(current, dc, dr) {
            distance += 1;
            current = next;
            if let Some((piece, color)) = squares[next as usize] {
                if color == by {
                    let steps_here = distance == 1
                        && steps(piece).iter().any(|&s| orient(s, by) == toward_target);
                    let slides_here = slides(piece).iter().any(|&s| orient(s, by) == toward_target);
                    if steps_here || slides_here {
                        return true;
                    }
                }
                break;
            }
        }
    }

    KNIGHT_STEPS.iter().any(|&step| {
        let (dc, dr) = orient(step, by);
        offset(target, -dc, -dr)
            .is_some_and(|from| squares[from as usize] == Some((Piece::Knight, by)))
    })
}

pub struct MoveGenerator;

impl Default for MoveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// All legal moves for the side to move.
    pub fn generate_moves(&self, board: &Board) -> Vec<Move> {
        self.pseudo_legal_moves(board)
            .into_iter()
            .filter(|mv| self.is_legal(board, mv))
            .collect()
    }

    pub fn has_legal_move(&self, board: &Board) -> bool {
        self.pseudo_legal_moves(board)
            .iter()
            .any(|mv| self.is_legal(board, mv))
    }

    pub fn is_move_valid(&self, board: &Board, mv: &Move) -> bool {
        self.pseudo_legal_moves(board).contains(mv) && self.is_legal(board, mv)
    }

    pub fn is_square_under_attack(&self, board: &Board, square: u8, attacker_color: Color) -> bool {
        is_attacked(board.squares(), square, attacker_color)
    }

    pub fn is_king_in_check(&self, board: &Board, color: Color) -> bool {
        board
            .king_square(color)
            .is_some_and(|king| is_attacked(board.squares(), king, color.opposite()))
    }

    pub fn get_game_state(&self, board: &Board) -> GameState {
        let us = board.side_to_move();
        if !self.has_legal_move(board) {
            if self.is_king_in_check(board, us) {
                GameState::Checkmate(us.opposite())
            } else {
                GameState::Stalemate
            }
        } else if board.repetition_count() >= REPETITION_LIMIT {
            GameState::Repetition
        } else {
            GameState::Ongoing
        }
    }

    /// Resolves USI move text against the legal moves of `board`.
    pub fn parse_usi(&self, board: &Board, text: &str) -> Result<Move, ParseError> {
        self.generate_moves(board)
            .into_iter()
            .find(|mv| mv.to_string() == text)
            .ok_or_else(|| ParseError::Move(text.to_string()))
    }

    fn pseudo_legal_moves(&self, board: &Board) -> Vec<Move> {
        let us = board.side_to_move();
        let squares = board.squares();
        let mut moves = Vec::with_capacity(128);

        for from in 0..NUM_SQUARES as u8 {
            let Some((piece, color)) = squares[from as usize] else {
                continue;
            };
            if color != us {
                continue;
            }

            for &step in steps(piece) {
                let (dc, dr) = orient(step, us);
                if let Some(to) = offset(from, dc, dr) {
                    match squares[to as usize] {
                        Some((_, owner)) if owner == us => {}
                        target => Self::add_board_moves(
                            &mut moves,
                            from,
                            to,
                            piece,
                            us,
                            target.map(|(p, _)| p),
                        ),
                    }
                }
            }

            for &slide in slides(piece) {
                let (dc, dr) = orient(slide, us);
                let mut current = from;
                while let Some(to) = offset(current, dc, dr) {
                    current = to;
                    match squares[to as usize] {
                        None => Self::add_board_moves(&mut moves, from, to, piece, us, None),
                        Some((target, owner)) => {
                            if owner != us {
                                Self::add_board_moves(
                                    &mut moves,
                                    from,
                                    to,
                                    piece,
                                    us,
                                    Some(target),
                                );
                            }
                            break;
                        }
                    }
                }
            }
        }

        let mut pawn_files = [false; 9];
        for (sq, slot) in squares.iter().enumerate() {
            if *slot == Some((Piece::Pawn, us)) {
                pawn_files[sq % 9] = true;
            }
        }

        for &piece in &Piece::HAND {
            if board.hand_count(us, piece) == 0 {
                continue;
            }
            for to in 0..NUM_SQUARES as u8 {
                if squares[to as usize].is_some() || is_dead_square(piece, to, us) {
                    continue;
                }
                if piece == Piece::Pawn && pawn_files[(to % 9) as usize] {
                    continue;
                }
                moves.push(Move::Drop { piece, to });
            }
        }

        moves
    }

    fn add_board_moves(
        moves: &mut Vec<Move>,
        from: u8,
        to: u8,
        piece: Piece,
        us: Color,
        captured: Option<Piece>,
    ) {
        let may_promote =
            piece.can_promote() && (in_promotion_zone(from, us) || in_promotion_zone(to, us));
        if may_promote {
            moves.push(Move::Board {
                from,
                to,
                piece,
                promotion: true,
                captured,
            });
        }
        if !is_dead_square(piece, to, us) {
            moves.push(Move::Board {
                from,
                to,
                piece,
                promotion: false,
                captured,
            });
        }
    }

    fn is_legal(&self, board: &Board, mv: &Move) -> bool {
        let us = board.side_to_move();
        let mut squares = *board.squares();

        let king = match *mv {
            Move::Board {
                from,
                to,
                piece,
                promotion,
                ..
            } => {
                squares[from as usize] = None;
                let placed = if promotion {
                    piece.promote().unwrap_or(piece)
                } else {
                    piece
                };
                squares[to as usize] = Some((placed, us));
                if piece == Piece::King {
                    Some(to)
                } else {
                    board.king_square(us)
                }
            }
            Move::Drop { piece, to } => {
                squares[to as usize] = Some((piece, us));
                board.king_square(us)
            }
        };

        if king.is_some_and(|king| is_attacked(&squares, king, us.opposite())) {
            return false;
        }

        !self.is_pawn_drop_mate(board, mv)
    }

    /// Uchifuzume: a pawn may not be dropped to give immediate checkmate.
    fn is_pawn_drop_mate(&self, board: &Board, mv: &Move) -> bool {
        let Move::Drop {
            piece: Piece::Pawn,
            to,
        } = *mv
        else {
            return false;
        };
        let us = board.side_to_move();
        let (dc, dr) = orient(PAWN_STEPS[0], us);
        let gives_check = match board.king_square(us.opposite()) {
            Some(king) => offset(to, dc, dr) == Some(king),
            None => false,
        };
        if !gives_check {
            return false;
        }

        let mut next = board.clone();
        next.make_move(*mv);
        !self.has_legal_move(&next)
    }
}
