//! Review error types

use std::time::Duration;

use thiserror::Error;

/// Failures of the evaluation oracle. Never fatal to a review.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Failed to spawn engine: {0}")]
    Spawn(String),

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Engine returned no lines")]
    NoResult,

    #[error("Engine protocol error: {0}")]
    Protocol(String),
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(#[from] OracleError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chess error: {0}")]
    Chess(#[from] chess_core::ChessError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Opening book error: {0}")]
    Book(#[from] bincode::Error),
}
