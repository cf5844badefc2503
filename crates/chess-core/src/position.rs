//! Immutable position snapshots used by the review pipeline.
//!
//! Wraps a shakmaty `Chess` position and precomputes the facts the review
//! pipeline reads on every ply (FEN, side to move, material).

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position as _, Role};

use crate::error::ChessError;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// Piece values in pawn units
pub const PAWN_VALUE: i32 = 1;
pub const KNIGHT_VALUE: i32 = 3;
pub const BISHOP_VALUE: i32 = 3;
pub const ROOK_VALUE: i32 = 5;
pub const QUEEN_VALUE: i32 = 9;

/// Piece value (king counts as zero)
pub fn role_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    fn color(self) -> Color {
        match self {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

/// Material of one side in pawn units, kings excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub pawns: i32,
    /// Knights, bishops, rooks and queens
    pub pieces: i32,
}

impl Material {
    pub fn total(&self) -> i32 {
        self.pawns + self.pieces
    }
}

/// A position snapshot. Cheap to clone, never mutated after construction.
#[derive(Debug, Clone)]
pub struct Position {
    chess: Chess,
    fen: String,
}

impl Default for Position {
    fn default() -> Self {
        Self::from_chess(Chess::default())
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.fen == other.fen
    }
}

impl Eq for Position {}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let parsed: Fen = fen.trim().parse()?;
        let chess: Chess = parsed.into_position(CastlingMode::Standard)?;
        Ok(Self::from_chess(chess))
    }

    fn from_chess(chess: Chess) -> Self {
        let fen = Fen::from_position(&chess, EnPassantMode::Legal).to_string();
        Self { chess, fen }
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    /// FEN without halfmove clock and fullmove counter, so transpositions
    /// into the same position share a fingerprint.
    pub fn fingerprint(&self) -> String {
        fingerprint_fen(&self.fen)
    }

    pub fn side_to_move(&self) -> Side {
        self.chess.turn().into()
    }

    pub fn fullmove_number(&self) -> u32 {
        self.chess.fullmoves().get()
    }

    /// Zero-based index of the next half-move to be played.
    pub fn ply(&self) -> u32 {
        let base = (self.fullmove_number() - 1) * 2;
        match self.side_to_move() {
            Side::White => base,
            Side::Black => base + 1,
        }
    }

    pub fn is_check(&self) -> bool {
        self.chess.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.chess.is_checkmate()
    }

    pub fn material(&self, side: Side) -> Material {
        let board = self.chess.board();
        let own = board.by_color(side.color());
        let count = |role: Role| (own & board.by_role(role)).count() as i32 * role_value(role);

        Material {
            pawns: count(Role::Pawn),
            pieces: count(Role::Knight) + count(Role::Bishop) + count(Role::Rook) + count(Role::Queen),
        }
    }

    /// Own material minus the opponent's, from `side`'s point of view.
    pub fn material_balance(&self, side: Side) -> i32 {
        self.material(side).total() - self.material(side.opponent()).total()
    }

    /// Combined non-pawn, non-king material of both sides.
    pub fn piece_material(&self) -> i32 {
        self.material(Side::White).pieces + self.material(Side::Black).pieces
    }

    fn parse_uci(&self, uci: &str) -> Result<Move, ChessError> {
        let parsed: UciMove = uci
            .parse()
            .map_err(|_| ChessError::UnparseableMove(uci.to_string()))?;
        parsed.to_move(&self.chess).map_err(|_| ChessError::IllegalMove {
            mv: uci.to_string(),
            fen: self.fen.clone(),
        })
    }

    pub fn is_legal_uci(&self, uci: &str) -> bool {
        self.parse_uci(uci).is_ok()
    }

    /// Whether a legal UCI move captures something (en passant included).
    pub fn is_capture_uci(&self, uci: &str) -> bool {
        self.parse_uci(uci).map(|m| m.is_capture()).unwrap_or(false)
    }

    pub fn play_uci(&self, uci: &str) -> Result<Position, ChessError> {
        let mv = self.parse_uci(uci)?;
        Ok(self.play(&mv))
    }

    /// Play a SAN move, returning the new position and the move in UCI form.
    pub fn play_san(&self, san: &str) -> Result<(Position, String), ChessError> {
        let parsed: SanPlus = san
            .parse()
            .map_err(|_| ChessError::UnparseableMove(san.to_string()))?;
        let mv = parsed.san.to_move(&self.chess).map_err(|_| ChessError::IllegalMove {
            mv: san.to_string(),
            fen: self.fen.clone(),
        })?;
        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        Ok((self.play(&mv), uci))
    }

    fn play(&self, mv: &Move) -> Position {
        let mut next = self.chess.clone();
        next.play_unchecked(*mv);
        Self::from_chess(next)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen)
    }
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
pub fn fingerprint_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_position() {
        let pos = Position::default();
        assert_eq!(pos.fen(), START_FEN);
        assert_eq!(pos.side_to_move(), Side::White);
        assert_eq!(pos.fullmove_number(), 1);
        assert_eq!(pos.ply(), 0);
        assert_eq!(pos.material(Side::White), Material { pawns: 8, pieces: 31 });
        assert_eq!(pos.material(Side::Black).total(), 39);
        assert_eq!(pos.piece_material(), 62);
    }

    #[test]
    fn test_fingerprint_ignores_counters() {
        let a = Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2").unwrap();
        let b = Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 6 9").unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(
            a.fingerprint(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq -"
        );
    }

    #[test]
    fn test_play_uci_and_san() {
        let pos = Position::default();
        let after = pos.play_uci("e2e4").unwrap();
        assert_eq!(after.side_to_move(), Side::Black);
        assert_eq!(after.ply(), 1);
        // No legal en passant capture, so the ep square is dropped
        assert_eq!(
            after.fingerprint(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq -"
        );

        let (after_san, uci) = after.play_san("Nf6").unwrap();
        assert_eq!(uci, "g8f6");
        assert_eq!(after_san.fullmove_number(), 2);

        assert!(pos.play_uci("e2e5").is_err());
        assert!(pos.play_uci("zz").is_err());
    }

    #[test]
    fn test_checkmate_and_capture() {
        // Fool's mate, final move Qh4#
        let pos = Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2").unwrap();
        let mated = pos.play_uci("d8h4").unwrap();
        assert!(mated.is_checkmate());
        assert!(mated.is_check());

        let pos = Position::from_fen("rnbqkb1r/pppp1ppp/5n2/4p2Q/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 3 3").unwrap();
        assert!(pos.is_capture_uci("f6h5"));
        assert!(!pos.is_capture_uci("b8c6"));
        let after = pos.play_uci("f6h5").unwrap();
        assert_eq!(after.material_balance(Side::Black), 9);
        assert_eq!(after.material_balance(Side::White), -9);
    }
}
