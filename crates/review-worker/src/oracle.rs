//! Candidate moves and the evaluation oracle interface.

use chess_core::Position;
use serde::{Deserialize, Serialize};

use crate::error::{OracleError, ReviewError};
use crate::eval::Score;

/// One engine-ranked move at a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMove {
    #[serde(rename = "move")]
    pub uci: String,
    /// 1 = best
    pub rank: u32,
    /// Relative to the side to move at the evaluated position
    pub score: Score,
    /// Principal variation starting with the move itself. May be empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pv: Vec<String>,
}

impl CandidateMove {
    pub fn new(uci: impl Into<String>, rank: u32, score: Score) -> Self {
        Self {
            uci: uci.into(),
            rank,
            score,
            pv: Vec::new(),
        }
    }

    pub fn with_pv<I, S>(mut self, pv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pv = pv.into_iter().map(Into::into).collect();
        self
    }
}

/// Engine candidates for one position, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSet {
    pub moves: Vec<CandidateMove>,
}

impl CandidateSet {
    pub fn new(moves: Vec<CandidateMove>) -> Self {
        Self { moves }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn best(&self) -> Option<&CandidateMove> {
        self.moves.first()
    }

    pub fn second(&self) -> Option<&CandidateMove> {
        self.moves.get(1)
    }

    /// Worst listed candidate
    pub fn last(&self) -> Option<&CandidateMove> {
        self.moves.last()
    }

    pub fn find(&self, uci: &str) -> Option<&CandidateMove> {
        self.moves.iter().find(|c| c.uci == uci)
    }

    /// Non-empty, ranks 1..=n in order, every candidate legal at `position`.
    pub fn validate(&self, position: &Position) -> Result<(), ReviewError> {
        if self.moves.is_empty() {
            return Err(ReviewError::MalformedInput("empty candidate set".into()));
        }
        for (i, candidate) in self.moves.iter().enumerate() {
            let expected = i as u32 + 1;
            if candidate.rank != expected {
                return Err(ReviewError::MalformedInput(format!(
                    "candidate ranks not contiguous: expected {expected}, got {} for {}",
                    candidate.rank, candidate.uci
                )));
            }
            if !position.is_legal_uci(&candidate.uci) {
                return Err(ReviewError::MalformedInput(format!(
                    "candidate {} is illegal in {}",
                    candidate.uci,
                    position.fen()
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<CandidateMove> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = CandidateMove>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Source of ranked engine evaluations.
///
/// Scores are relative to the side to move at `position`. Implementations
/// own their engine; callers apply their own timeouts.
#[allow(async_fn_in_trait)]
pub trait Oracle {
    /// Up to `multipv` best moves searched to `depth`.
    async fn evaluate(
        &mut self,
        position: &Position,
        multipv: u32,
        depth: u32,
    ) -> Result<CandidateSet, OracleError>;

    /// Evaluation of one specific move, searched to `depth`.
    async fn evaluate_move(
        &mut self,
        position: &Position,
        uci: &str,
        depth: u32,
    ) -> Result<CandidateMove, OracleError>;
}
