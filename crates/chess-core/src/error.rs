//! Rules-layer error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChessError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(#[from] shakmaty::fen::ParseFenError),

    #[error("Illegal position: {0}")]
    IllegalPosition(#[from] shakmaty::PositionError<shakmaty::Chess>),

    #[error("Unparseable move: {0}")]
    UnparseableMove(String),

    #[error("Illegal move {mv} in {fen}")]
    IllegalMove { mv: String, fen: String },

    #[error("PGN has no moves")]
    EmptyGame,
}
