use serde::{Deserialize, Serialize};

use crate::error::ChessError;
use crate::position::Position;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub event: Option<String>,
    pub eco: Option<String>,
    pub opening: Option<String>,
    /// Starting FEN when the game did not begin from the standard position
    pub start_fen: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN notation
}

/// One half-move of a replayed game.
#[derive(Debug, Clone)]
pub struct PlayedPly {
    pub before: Position,
    pub san: String,
    pub uci: String,
    pub after: Position,
}

impl GameData {
    pub fn start_position(&self) -> Result<Position, ChessError> {
        match &self.metadata.start_fen {
            Some(fen) => Position::from_fen(fen),
            None => Ok(Position::default()),
        }
    }

    /// Replay the SAN mainline, producing before/after snapshots per ply.
    /// Stops with an error at the first move that is not legal.
    pub fn replay(&self) -> Result<Vec<PlayedPly>, ChessError> {
        let mut position = self.start_position()?;
        let mut plies = Vec::with_capacity(self.moves.len());

        for san in &self.moves {
            let (after, uci) = position.play_san(san)?;
            plies.push(PlayedPly {
                before: position,
                san: san.clone(),
                uci,
                after: after.clone(),
            });
            position = after;
        }

        Ok(plies)
    }
}
