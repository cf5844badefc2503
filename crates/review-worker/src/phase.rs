//! Game phase detection from material and move number.
//!
//! The phase widens or keeps the loss bucket thresholds used by the classifier.

use std::fmt;

use chess_core::Position;
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

impl Phase {
    /// Endgame when the combined piece material (no pawns, no kings) is at
    /// or below the configured floor; opening while early and nearly all
    /// pieces remain.
    pub fn detect(position: &Position, config: &ClassifierConfig) -> Phase {
        let pieces = position.piece_material();
        if pieces <= config.endgame_piece_material {
            Phase::Endgame
        } else if position.fullmove_number() <= config.opening_max_fullmove
            && pieces >= config.opening_min_piece_material
        {
            Phase::Opening
        } else {
            Phase::Middlegame
        }
    }

    pub fn threshold_scale(self, config: &ClassifierConfig) -> f64 {
        match self {
            Phase::Opening => config.opening_threshold_scale,
            Phase::Middlegame => config.middlegame_threshold_scale,
            Phase::Endgame => config.endgame_threshold_scale,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Middlegame => "middlegame",
            Phase::Endgame => "endgame",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
