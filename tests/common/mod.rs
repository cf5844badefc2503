//! Shared helpers for the review integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use chess_core::Position;
use review_worker::{CandidateMove, CandidateSet, Oracle, OracleError, Score};

/// Deterministic oracle keyed by position fingerprint.
#[derive(Default)]
pub struct StubOracle {
    positions: HashMap<String, CandidateSet>,
    /// Number of `evaluate` calls, verification included
    pub evaluations: usize,
}

impl StubOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, position: &Position, candidates: Vec<CandidateMove>) -> Self {
        self.positions
            .insert(position.fingerprint(), CandidateSet::new(candidates));
        self
    }
}

impl Oracle for StubOracle {
    async fn evaluate(
        &mut self,
        position: &Position,
        multipv: u32,
        _depth: u32,
    ) -> Result<CandidateSet, OracleError> {
        self.evaluations += 1;
        let set = self
            .positions
            .get(&position.fingerprint())
            .ok_or(OracleError::NoResult)?;
        Ok(set.moves.iter().take(multipv as usize).cloned().collect())
    }

    async fn evaluate_move(
        &mut self,
        position: &Position,
        uci: &str,
        _depth: u32,
    ) -> Result<CandidateMove, OracleError> {
        self.positions
            .get(&position.fingerprint())
            .and_then(|set| set.find(uci))
            .cloned()
            .ok_or(OracleError::NoResult)
    }
}

pub fn cp(uci: &str, rank: u32, score: i32) -> CandidateMove {
    CandidateMove::new(uci, rank, Score::Cp(score))
}

pub fn mate(uci: &str, rank: u32, moves: i32) -> CandidateMove {
    CandidateMove::new(uci, rank, Score::Mate(moves))
}

/// Centipawn score whose win probability is `p` with the default slope.
pub fn cp_for(p: f64) -> i32 {
    ((p / (1.0 - p)).ln() / 0.00368).round() as i32
}

pub fn position(fen: &str) -> Position {
    Position::from_fen(fen).expect("valid FEN")
}

/// Replay a space separated SAN line from the start position.
pub fn after_line(line: &str) -> Position {
    line.split_whitespace()
        .fold(Position::default(), |pos, san| pos.play_san(san).expect("legal SAN").0)
}
