use std::fmt;
use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ParseError;
use crate::movegen::Move;

pub const START_SFEN: &str = "lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1";

pub const NUM_SQUARES: usize = 81;
pub const HAND_TYPES: usize = 7;

/// Largest number of one piece type a side can hold (all eighteen pawns).
const MAX_HAND: usize = 18;

/// Pieces of each droppable type in a full set, indexed like `Piece::hand_index`.
const PIECE_TOTALS: [u8; HAND_TYPES] = [18, 4, 4, 4, 4, 2, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Piece {
    Pawn,
    Lance,
    Knight,
    Silver,
    Gold,
    Bishop,
    Rook,
    King,
    ProPawn,
    ProLance,
    ProKnight,
    ProSilver,
    Horse,
    Dragon,
}

impl Piece {
    /// Piece types that can be held in hand, in `hand_index` order.
    pub const HAND: [Piece; HAND_TYPES] = [
        Piece::Pawn,
        Piece::Lance,
        Piece::Knight,
        Piece::Silver,
        Piece::Gold,
        Piece::Bishop,
        Piece::Rook,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn hand_index(self) -> Option<usize> {
        match self {
            Piece::Pawn => Some(0),
            Piece::Lance => Some(1),
            Piece::Knight => Some(2),
            Piece::Silver => Some(3),
            Piece::Gold => Some(4),
            Piece::Bishop => Some(5),
            Piece::Rook => Some(6),
            _ => None,
        }
    }

    pub fn promote(self) -> Option<Piece> {
        match self {
            Piece::Pawn => Some(Piece::ProPawn),
            Piece::Lance => Some(Piece::ProLance),
            Piece::Knight => Some(Piece::ProKnight),
            Piece::Silver => Some(Piece::ProSilver),
            Piece::Bishop => Some(Piece::Horse),
            Piece::Rook => Some(Piece::Dragon),
            _ => None,
        }
    }

    pub fn unpromote(self) -> Piece {
        match self {
            Piece::ProPawn => Piece::Pawn,
            Piece::ProLance => Piece::Lance,
            Piece::ProKnight => Piece::Knight,
            Piece::ProSilver => Piece::Silver,
            Piece::Horse => Piece::Bishop,
            Piece::Dragon => Piece::Rook,
            other => other,
        }
    }

    pub fn can_promote(self) -> bool {
        self.promote().is_some()
    }

    pub fn is_promoted(self) -> bool {
        self.unpromote() != self
    }

    fn sfen_letter(self) -> char {
        match self.unpromote() {
            Piece::Pawn => 'P',
            Piece::Lance => 'L',
            Piece::Knight => 'N',
            Piece::Silver => 'S',
            Piece::Gold => 'G',
            Piece::Bishop => 'B',
            Piece::Rook => 'R',
            _ => 'K',
        }
    }

    fn from_sfen_letter(c: char) -> Option<(Piece, Color)> {
        let color = if c.is_ascii_uppercase() {
            Color::Black
        } else {
            Color::White
        };
        let piece = match c.to_ascii_uppercase() {
            'P' => Piece::Pawn,
            'L' => Piece::Lance,
            'N' => Piece::Knight,
            'S' => Piece::Silver,
            'G' => Piece::Gold,
            'B' => Piece::Bishop,
            'R' => Piece::Rook,
            'K' => Piece::King,
            _ => return None,
        };
        Some((piece, color))
    }

    /// SFEN spelling for the given owner, e.g. `P`, `+p`, `k`.
    pub fn to_sfen(self, color: Color) -> String {
        let letter = match color {
            Color::Black => self.sfen_letter(),
            Color::White => self.sfen_letter().to_ascii_lowercase(),
        };
        if self.is_promoted() {
            format!("+{letter}")
        } else {
            letter.to_string()
        }
    }
}

/// Black (sente) moves first and advances toward rank `a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Square index for a USI file (1..=9) and rank (0 = `a` ..= 8 = `i`).
pub fn square(file: u8, rank: u8) -> u8 {
    rank * 9 + (9 - file)
}

pub fn file_of(square: u8) -> u8 {
    9 - square % 9
}

pub fn rank_of(square: u8) -> u8 {
    square / 9
}

/// Rank counted from `color`'s point of view: 0 is the far rank.
pub fn relative_rank(square: u8, color: Color) -> u8 {
    match color {
        Color::Black => rank_of(square),
        Color::White => 8 - rank_of(square),
    }
}

pub fn in_promotion_zone(square: u8, color: Color) -> bool {
    relative_rank(square, color) < 3
}

pub fn square_name(square: u8) -> String {
    format!("{}{}", file_of(square), (b'a' + rank_of(square)) as char)
}

pub fn parse_square(text: &str) -> Option<u8> {
    let mut chars = text.chars();
    let file = chars.next()?.to_digit(10)? as u8;
    let rank = chars.next()?;
    if chars.next().is_some() || !(1..=9).contains(&file) || !('a'..='i').contains(&rank) {
        return None;
    }
    Some(square(file, rank as u8 - b'a'))
}

struct ZobristKeys {
    pieces: [[[u64; NUM_SQUARES]; 14]; 2],
    /// Index 0 stays zero so an empty hand contributes nothing.
    hands: [[[u64; MAX_HAND + 1]; HAND_TYPES]; 2],
    side_to_move: u64,
}

impl ZobristKeys {
    fn generate() -> Self {
        let mut rng = StdRng::seed_from_u64(0x5348_4f47_4953_414c);

        let mut pieces = [[[0u64; NUM_SQUARES]; 14]; 2];
        for color in &mut pieces {
            for piece in color {
                for key in piece {
                    *key = rng.gen();
                }
            }
        }

        let mut hands = [[[0u64; MAX_HAND + 1]; HAND_TYPES]; 2];
        for color in &mut hands {
            for piece in color {
                for key in piece.iter_mut().skip(1) {
                    *key = rng.gen();
                }
            }
        }

        Self {
            pieces,
            hands,
            side_to_move: rng.gen(),
        }
    }

    fn piece(&self, piece: Piece, color: Color, square: u8) -> u64 {
        self.pieces[color.index()][piece.index()][square as usize]
    }

    fn hand(&self, color: Color, hand_index: usize, count: u8) -> u64 {
        self.hands[color.index()][hand_index]
            .get(count as usize)
            .copied()
            .unwrap_or(0)
    }
}

static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::generate);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Undo {
    mv: Move,
    captured: Option<Piece>,
    hash: u64,
}

/// A shogi position. Moves are applied with `make_move` and reverted with
/// `unmake_move`; every field, the hash included, is restored exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [Option<(Piece, Color)>; NUM_SQUARES],
    hands: [[u8; HAND_TYPES]; 2],
    side_to_move: Color,
    move_number: u32,
    hash: u64,
    undo_stack: Vec<Undo>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard starting position.
    pub fn new() -> Self {
        use Piece::*;

        let mut board = Self::empty();
        let back_rank = [Lance, Knight, Silver, Gold, King, Gold, Silver, Knight, Lance];
        for (col, &piece) in back_rank.iter().enumerate() {
            board.squares[col] = Some((piece, Color::White));
            board.squares[2 * 9 + col] = Some((Pawn, Color::White));
            board.squares[6 * 9 + col] = Some((Pawn, Color::Black));
            board.squares[8 * 9 + col] = Some((piece, Color::Black));
        }
        board.squares[square(8, 1) as usize] = Some((Rook, Color::White));
        board.squares[square(2, 1) as usize] = Some((Bishop, Color::White));
        board.squares[square(8, 7) as usize] = Some((Bishop, Color::Black));
        board.squares[square(2, 7) as usize] = Some((Rook, Color::Black));
        board.hash = board.compute_hash();
        board
    }

    fn empty() -> Self {
        Self {
            squares: [None; NUM_SQUARES],
            hands: [[0; HAND_TYPES]; 2],
            side_to_move: Color::Black,
            move_number: 1,
            hash: 0,
            undo_stack: Vec::new(),
        }
    }

    pub fn from_sfen(sfen: &str) -> Result<Self, ParseError> {
        let sfen = sfen.trim();
        let mut fields = sfen.split_whitespace();
        let placement = fields
            .next()
            .ok_or_else(|| ParseError::sfen(sfen, "empty string"))?;
        let side = fields
            .next()
            .ok_or_else(|| ParseError::sfen(sfen, "missing side to move"))?;
        let hands = fields.next().unwrap_or("-");
        let move_number = match fields.next() {
            Some(n) => n
                .parse::<u32>()
                .map_err(|_| ParseError::sfen(sfen, format!("bad move number `{n}`")))?,
            None => 1,
        };

        let mut board = Self::empty();

        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != 9 {
            return Err(ParseError::sfen(sfen, "expected 9 ranks"));
        }
        for (rank, row) in rows.iter().enumerate() {
            let mut col = 0usize;
            let mut promoted = false;
            for c in row.chars() {
                if c == '+' {
                    promoted = true;
                    continue;
                }
                if let Some(empty) = c.to_digit(10) {
                    if promoted {
                        return Err(ParseError::sfen(sfen, "`+` before a digit"));
                    }
                    col += empty as usize;
                    continue;
                }
                let (piece, color) = Piece::from_sfen_letter(c)
                    .ok_or_else(|| ParseError::sfen(sfen, format!("unknown piece `{c}`")))?;
                let piece = if promoted {
                    piece
                        .promote()
                        .ok_or_else(|| ParseError::sfen(sfen, format!("`{c}` cannot promote")))?
                } else {
                    piece
                };
                if col >= 9 {
                    return Err(ParseError::sfen(sfen, format!("rank {} too long", rank + 1)));
                }
                board.squares[rank * 9 + col] = Some((piece, color));
                col += 1;
                promoted = false;
            }
            if col != 9 || promoted {
                return Err(ParseError::sfen(sfen, format!("rank {} has wrong width", rank + 1)));
            }
        }

        board.side_to_move = match side {
            "b" => Color::Black,
            "w" => Color::White,
            other => return Err(ParseError::sfen(sfen, format!("bad side `{other}`"))),
        };

        if hands != "-" {
            let mut count: Option<u32> = None;
            for c in hands.chars() {
                if let Some(d) = c.to_digit(10) {
                    count = count
                        .unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(d))
                        .filter(|&n| n as usize <= MAX_HAND);
                    if count.is_none() {
                        return Err(ParseError::sfen(sfen, "too many pieces in hand"));
                    }
                    continue;
                }
                let (piece, color) = Piece::from_sfen_letter(c)
                    .ok_or_else(|| ParseError::sfen(sfen, format!("unknown hand piece `{c}`")))?;
                let index = piece
                    .hand_index()
                    .ok_or_else(|| ParseError::sfen(sfen, "kings cannot be held in hand"))?;
                let n = count.take().unwrap_or(1) as usize;
                let held = &mut board.hands[color.index()][index];
                if *held as usize + n > MAX_HAND {
                    return Err(ParseError::sfen(sfen, "too many pieces in hand"));
                }
                *held += n as u8;
            }
            if count.is_some() {
                return Err(ParseError::sfen(sfen, "dangling hand count"));
            }
        }

        board.validate_material(sfen)?;
        board.move_number = move_number;
        board.hash = board.compute_hash();
        Ok(board)
    }

    fn validate_material(&self, sfen: &str) -> Result<(), ParseError> {
        let mut totals = [0u32; HAND_TYPES];
        let mut kings = [0u32; 2];
        for &(piece, color) in self.squares.iter().flatten() {
            match piece.unpromote().hand_index() {
                Some(index) => totals[index] += 1,
                None => kings[color.index()] += 1,
            }
        }
        for hand in &self.hands {
            for (index, &count) in hand.iter().enumerate() {
                totals[index] += count as u32;
            }
        }
        if kings.iter().any(|&k| k > 1) {
            return Err(ParseError::sfen(sfen, "more than one king per side"));
        }
        for (index, &total) in totals.iter().enumerate() {
            if total > PIECE_TOTALS[index] as u32 {
                return Err(ParseError::sfen(
                    sfen,
                    format!("too many {:?}s", Piece::HAND[index]),
                ));
            }
        }
        Ok(())
    }

    pub fn to_sfen(&self) -> String {
        let mut placement = String::new();
        for rank in 0..9 {
            let mut empty = 0;
            for col in 0..9 {
                match self.squares[rank * 9 + col] {
                    Some((piece, color)) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push_str(&piece.to_sfen(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank < 8 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::Black => "b",
            Color::White => "w",
        };

        let mut hands = self.hand_sfen(Color::Black);
        hands.push_str(&self.hand_sfen(Color::White));
        if hands.is_empty() {
            hands.push('-');
        }

        format!("{placement} {side} {hands} {}", self.move_number)
    }

    /// Hand in SFEN order (rook first), e.g. `R2P`; empty when nothing is held.
    fn hand_sfen(&self, color: Color) -> String {
        let mut out = String::new();
        for &piece in Piece::HAND.iter().rev() {
            let count = self.hand_count(color, piece);
            if count > 1 {
                out.push_str(&count.to_string());
            }
            if count > 0 {
                out.push_str(&piece.to_sfen(color));
            }
        }
        out
    }

    fn compute_hash(&self) -> u64 {
        let mut hash = 0u64;
        for (sq, slot) in self.squares.iter().enumerate() {
            if let Some((piece, color)) = *slot {
                hash ^= ZOBRIST.piece(piece, color, sq as u8);
            }
        }
        for color in [Color::Black, Color::White] {
            for (index, &count) in self.hands[color.index()].iter().enumerate() {
                hash ^= ZOBRIST.hand(color, index, count);
            }
        }
        if self.side_to_move == Color::White {
            hash ^= ZOBRIST.side_to_move;
        }
        hash
    }

    pub fn get_piece_at(&self, square: u8) -> Option<(Piece, Color)> {
        self.squares.get(square as usize).copied().flatten()
    }

    pub(crate) fn squares(&self) -> &[Option<(Piece, Color)>; NUM_SQUARES] {
        &self.squares
    }

    pub fn hand_count(&self, color: Color, piece: Piece) -> u8 {
        piece
            .hand_index()
            .map_or(0, |index| self.hands[color.index()][index])
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn king_square(&self, color: Color) -> Option<u8> {
        self.squares
            .iter()
            .position(|&slot| slot == Some((Piece::King, color)))
            .map(|sq| sq as u8)
    }

    /// How many earlier positions in the game share the current hash.
    pub fn repetition_count(&self) -> usize {
        self.undo_stack
            .iter()
            .filter(|undo| undo.hash == self.hash)
            .count()
    }

    fn take(&mut self, square: u8) -> Option<(Piece, Color)> {
        let taken = self.squares[square as usize].take();
        if let Some((piece, color)) = taken {
            self.hash ^= ZOBRIST.piece(piece, color, square);
        }
        taken
    }

    fn put(&mut self, square: u8, piece: Piece, color: Color) {
        self.take(square);
        self.squares[square as usize] = Some((piece, color));
        self.hash ^= ZOBRIST.piece(piece, color, square);
    }

    fn write_hand(&mut self, color: Color, index: usize, count: u8) {
        let slot = &mut self.hands[color.index()][index];
        self.hash ^= ZOBRIST.hand(color, index, *slot);
        *slot = count;
        self.hash ^= ZOBRIST.hand(color, index, count);
    }

    fn adjust_hand(&mut self, color: Color, piece: Piece, delta: i8) {
        if let Some(index) = piece.unpromote().hand_index() {
            let current = self.hands[color.index()][index];
            let next = (current as i16 + delta as i16).clamp(0, MAX_HAND as i16) as u8;
            self.write_hand(color, index, next);
        }
    }

    /// Applies a move produced by the move generator for this position.
    pub fn make_move(&mut self, mv: Move) {
        let us = self.side_to_move;
        let hash = self.hash;

        let captured = match mv {
            Move::Board {
                from,
                to,
                piece,
                promotion,
                ..
            } => {
                debug_assert_eq!(self.get_piece_at(from), Some((piece, us)));
                self.take(from);
                let captured = self.take(to).map(|(captured, _)| captured);
                if let Some(captured) = captured {
                    self.adjust_hand(us, captured, 1);
                }
                let placed = if promotion {
                    piece.promote().unwrap_or(piece)
                } else {
                    piece
                };
                self.put(to, placed, us);
                captured
            }
            Move::Drop { piece, to } => {
                debug_assert!(self.hand_count(us, piece) > 0);
                self.adjust_hand(us, piece, -1);
                self.put(to, piece, us);
                None
            }
        };

        self.side_to_move = us.opposite();
        self.hash ^= ZOBRIST.side_to_move;
        self.move_number += 1;
        self.undo_stack.push(Undo { mv, captured, hash });
    }

    /// Reverts the last move and returns it, or `None` at the start of the record.
    pub fn unmake_move(&mut self) -> Option<Move> {
        let undo = self.undo_stack.pop()?;
        let us = self.side_to_move.opposite();

        match undo.mv {
            Move::Board { from, to, piece, .. } => {
                self.take(to);
                if let Some(captured) = undo.captured {
                    self.put(to, captured, us.opposite());
                    self.adjust_hand(us, captured, -1);
                }
                self.put(from, piece, us);
            }
            Move::Drop { piece, to } => {
                self.take(to);
                self.adjust_hand(us, piece, 1);
            }
        }

        self.side_to_move = us;
        self.hash ^= ZOBRIST.side_to_move;
        self.move_number -= 1;
        debug_assert_eq!(self.hash, undo.hash);
        self.hash = undo.hash;
        Some(undo.mv)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let hand = |color| {
            let hand = self.hand_sfen(color);
            if hand.is_empty() {
                "-".to_string()
            } else {
                hand
            }
        };

        writeln!(f, "White hand: {}", hand(Color::White))?;
        for file in (1..=9).rev() {
            write!(f, " {file} ")?;
        }
        writeln!(f)?;
        for rank in 0..9u8 {
            for col in 0..9u8 {
                let cell = match self.squares[(rank * 9 + col) as usize] {
                    Some((piece, color)) => format!("{:>2}", piece.to_sfen(color)),
                    None => " .".to_string(),
                };
                write!(f, "{cell} ")?;
            }
            writeln!(f, " {}", (b'a' + rank) as char)?;
        }
        write!(f, "Black hand: {}", hand(Color::Black))
    }
}
