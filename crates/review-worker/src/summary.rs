//! Game aggregation: folds move records into per-player statistics.

use std::collections::BTreeMap;

use chess_core::Side;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classifier::Label;
use crate::config::ClassifierConfig;
use crate::opening::OpeningInfo;
use crate::record::MoveRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub moves: u32,
    pub labels: BTreeMap<Label, u32>,
    /// `None` when no move of this player was analyzed
    pub accuracy: Option<f64>,
    pub unanalyzed: u32,
}

impl PlayerSummary {
    pub fn count(&self, label: Label) -> u32 {
        self.labels.get(&label).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub white: PlayerSummary,
    pub black: PlayerSummary,
    pub opening: Option<OpeningInfo>,
    pub result: String,
}

impl GameSummary {
    pub fn player(&self, side: Side) -> &PlayerSummary {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PlayerTally {
    moves: u32,
    labels: BTreeMap<Label, u32>,
    unanalyzed: u32,
    weighted_accuracy: f64,
    total_weight: f64,
}

impl PlayerTally {
    fn fold(&mut self, record: &MoveRecord, lapse_damping: f64, recency_decay: f64) {
        self.moves += 1;
        let Some(label) = record.label else {
            self.unanalyzed += 1;
            return;
        };
        *self.labels.entry(label).or_insert(0) += 1;

        // Low accuracy shrinks the weight, older moves fade
        let weight = (-lapse_damping * (1.0 - record.accuracy / 100.0)).exp();
        self.weighted_accuracy = self.weighted_accuracy * recency_decay + weight * record.accuracy;
        self.total_weight = self.total_weight * recency_decay + weight;
    }

    fn finish(self) -> PlayerSummary {
        let accuracy = (self.total_weight > 0.0).then(|| self.weighted_accuracy / self.total_weight);
        PlayerSummary {
            moves: self.moves,
            labels: self.labels,
            accuracy,
            unanalyzed: self.unanalyzed,
        }
    }
}

/// In-progress fold over one game's records, in ply order.
#[derive(Debug, Clone)]
pub struct ReviewTally {
    lapse_damping: f64,
    recency_decay: f64,
    white: PlayerTally,
    black: PlayerTally,
    opening: Option<OpeningInfo>,
    last_ply: Option<u32>,
}

impl ReviewTally {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            lapse_damping: config.lapse_damping,
            recency_decay: config.recency_decay,
            white: PlayerTally::default(),
            black: PlayerTally::default(),
            opening: None,
            last_ply: None,
        }
    }

    /// Fold one record. Records at or before the last folded ply are ignored.
    pub fn aggregate(mut self, record: &MoveRecord) -> Self {
        if self.last_ply.is_some_and(|last| record.ply <= last) {
            warn!(ply = record.ply, last = ?self.last_ply, "Ignoring out-of-order move record");
            return self;
        }
        self.last_ply = Some(record.ply);

        let (lapse, decay) = (self.lapse_damping, self.recency_decay);
        match record.side {
            Side::White => self.white.fold(record, lapse, decay),
            Side::Black => self.black.fold(record, lapse, decay),
        }

        // Recognized but out-of-tolerance book moves do not name the game
        if self.opening.is_none() && record.label == Some(Label::Book) {
            self.opening = record.opening.clone();
        }
        self
    }

    pub fn moves_folded(&self) -> u32 {
        self.white.moves + self.black.moves
    }

    pub fn finish(self, result: impl Into<String>) -> GameSummary {
        GameSummary {
            white: self.white.finish(),
            black: self.black.finish(),
            opening: self.opening,
            result: result.into(),
        }
    }
}
