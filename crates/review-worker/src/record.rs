//! Per-move review output.

use chess_core::Side;
use serde::{Deserialize, Serialize};

use crate::classifier::Label;
use crate::opening::OpeningInfo;
use crate::phase::Phase;
use crate::sacrifice::SacrificeCheck;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFlags {
    /// The played line allows a forced mate against the mover
    pub mate_threat: bool,
    pub mate_delivered: bool,
    /// A forced mate was available and the played move gave it up
    pub mate_missed: bool,
    pub check: bool,
    pub critical: bool,
    pub sacrifice: SacrificeCheck,
}

/// Classification of a single ply. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Zero-based half-move index
    pub ply: u32,
    pub move_number: u32,
    pub side: Side,
    #[serde(rename = "move")]
    pub played: String,
    pub fen_before: String,
    /// Rank among the candidates, `None` if the move was not listed
    pub rank: Option<u32>,
    pub best_move: Option<String>,
    pub win_before: f64,
    pub win_after: f64,
    pub loss: f64,
    pub accuracy: f64,
    /// Mover's material change in pawn units
    pub material_delta: i32,
    pub flags: MoveFlags,
    pub phase: Phase,
    /// Position after the move is in the opening table within the book window
    pub book: bool,
    /// Opening recognized after the move, set whenever `book` is
    pub opening: Option<OpeningInfo>,
    /// `None` for unanalyzed plies
    pub label: Option<Label>,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unanalyzed: Option<String>,
}

impl MoveRecord {
    pub fn is_analyzed(&self) -> bool {
        self.label.is_some()
    }
}
