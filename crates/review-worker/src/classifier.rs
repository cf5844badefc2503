//! Move classification: an ordered rule chain over per-move facts.
//!
//! Every rule is a pure predicate; the first one that holds decides the
//! label. Order matters and is fixed by [`RULES`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::eval::Score;
use crate::phase::Phase;
use crate::sacrifice::SacrificeCheck;

/// Move quality labels, declared in reporting order (least to most severe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Brilliant,
    Great,
    Best,
    Book,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    Miss,
}

impl Label {
    pub const ALL: [Label; 9] = [
        Label::Brilliant,
        Label::Great,
        Label::Best,
        Label::Book,
        Label::Good,
        Label::Inaccuracy,
        Label::Mistake,
        Label::Blunder,
        Label::Miss,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Label::Brilliant => "Brilliant",
            Label::Great => "Great",
            Label::Best => "Best",
            Label::Book => "Book",
            Label::Good => "Good",
            Label::Inaccuracy => "Inaccuracy",
            Label::Mistake => "Mistake",
            Label::Blunder => "Blunder",
            Label::Miss => "Miss",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the rules look at for one move. Probabilities are from the
/// mover's point of view.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveFacts {
    /// Rank of the played move among the candidates, `None` if not listed
    pub rank: Option<u32>,
    pub candidate_count: usize,
    pub best_score: Score,
    pub win_best: f64,
    pub win_second: Option<f64>,
    pub win_played: f64,
    /// Already capped for lost positions
    pub loss: f64,
    pub material_delta: i32,
    pub sacrifice: SacrificeCheck,
    pub book: bool,
    pub delivers_mate: bool,
    pub phase: Phase,
}

impl MoveFacts {
    /// Two or more candidates, a clear gap between the best two, and the
    /// best one not already losing.
    pub fn is_critical(&self, config: &ClassifierConfig) -> bool {
        match self.win_second {
            Some(second) if self.candidate_count >= 2 => {
                self.win_best - second >= config.critical_gap
                    && self.win_best >= config.near_equal_floor
            }
            _ => false,
        }
    }

    pub fn best_is_decisive(&self, config: &ClassifierConfig) -> bool {
        self.best_score.is_mate_for() || self.win_best >= config.decisive_threshold
    }
}

/// Loss = max(0, best - played), capped at the lost floor when the best
/// candidate already loses.
/// Already lost before the move: every move costs at most `lost_floor`.
pub fn is_lost(win_best: f64, best_score: Score, config: &ClassifierConfig) -> bool {
    best_score.is_mate_against() || win_best <= config.lost_floor
}

pub fn move_loss(win_best: f64, win_played: f64, best_score: Score, config: &ClassifierConfig) -> f64 {
    let loss = (win_best - win_played).max(0.0);
    if is_lost(win_best, best_score, config) {
        loss.min(config.lost_floor)
    } else {
        loss
    }
}

pub type Rule = fn(&MoveFacts, &ClassifierConfig) -> bool;

/// The rule chain, first match wins.
pub const RULES: &[(Label, Rule)] = &[
    (Label::Best, delivers_checkmate),
    (Label::Brilliant, is_brilliant),
    (Label::Book, is_book),
    (Label::Great, is_great),
    (Label::Best, is_best),
    (Label::Miss, is_miss),
    (Label::Good, is_good),
    (Label::Inaccuracy, is_inaccuracy),
    (Label::Mistake, is_mistake),
    (Label::Blunder, is_blunder),
];

pub fn classify_facts(facts: &MoveFacts, config: &ClassifierConfig) -> Label {
    RULES
        .iter()
        .find(|(_, rule)| rule(facts, config))
        .map(|(label, _)| *label)
        .unwrap_or(Label::Blunder)
}

pub fn delivers_checkmate(facts: &MoveFacts, _: &ClassifierConfig) -> bool {
    facts.delivers_mate
}

pub fn is_brilliant(facts: &MoveFacts, config: &ClassifierConfig) -> bool {
    facts.rank.is_some()
        && facts.material_delta <= -config.sacrifice_min_material
        && facts.sacrifice.is_sound()
        && facts.win_played >= config.winning_cutoff
}

pub fn is_book(facts: &MoveFacts, config: &ClassifierConfig) -> bool {
    facts.rank.is_some() && facts.book && facts.loss < config.book_tolerance
}

/// Only the top move keeps the position together.
pub fn is_great(facts: &MoveFacts, config: &ClassifierConfig) -> bool {
    facts.rank == Some(1) && facts.is_critical(config)
}

pub fn is_best(facts: &MoveFacts, config: &ClassifierConfig) -> bool {
    match facts.rank {
        Some(1) => true,
        Some(_) => facts.loss < config.best_epsilon,
        None => false,
    }
}

pub fn is_miss(facts: &MoveFacts, config: &ClassifierConfig) -> bool {
    facts.rank.is_some()
        && facts.best_is_decisive(config)
        && facts.win_played < config.decisive_threshold
}

fn bucket_limit(limit: f64, facts: &MoveFacts, config: &ClassifierConfig) -> f64 {
    limit * facts.phase.threshold_scale(config)
}

pub fn is_good(facts: &MoveFacts, config: &ClassifierConfig) -> bool {
    facts.loss < bucket_limit(config.good_max, facts, config)
}

pub fn is_inaccuracy(facts: &MoveFacts, config: &ClassifierConfig) -> bool {
    facts.loss < bucket_limit(config.inaccuracy_max, facts, config)
}

pub fn is_mistake(facts: &MoveFacts, config: &ClassifierConfig) -> bool {
    facts.loss < bucket_limit(config.mistake_max, facts, config)
}

/// Catch-all
pub fn is_blunder(_: &MoveFacts, _: &ClassifierConfig) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(win_best: f64, win_played: f64) -> MoveFacts {
        MoveFacts {
            rank: Some(3),
            candidate_count: 5,
            best_score: Score::Cp(0),
            win_best,
            win_second: Some(win_best - 0.01),
            win_played,
            loss: (win_best - win_played).max(0.0),
            material_delta: 0,
            sacrifice: SacrificeCheck::NotApplicable,
            book: false,
            delivers_mate: false,
            phase: Phase::Middlegame,
        }
    }

    fn label(facts: &MoveFacts) -> Label {
        classify_facts(facts, &ClassifierConfig::default())
    }

    #[test]
    fn test_checkmate_always_best() {
        let mut f = facts(0.6, 0.1);
        f.delivers_mate = true;
        f.material_delta = -9;
        f.rank = None;
        assert_eq!(label(&f), Label::Best);
    }

    #[test]
    fn test_brilliant_needs_sound_sacrifice() {
        let mut f = facts(0.80, 0.79);
        f.material_delta = -5;
        f.sacrifice = SacrificeCheck::Sound;
        assert_eq!(label(&f), Label::Brilliant);

        for check in [SacrificeCheck::Unsound, SacrificeCheck::Failed, SacrificeCheck::NotApplicable] {
            f.sacrifice = check;
            assert_ne!(label(&f), Label::Brilliant);
        }

        // Sound but no longer winning
        let mut f = facts(0.52, 0.50);
        f.material_delta = -3;
        f.sacrifice = SacrificeCheck::Sound;
        assert_ne!(label(&f), Label::Brilliant);
    }

    #[test]
    fn test_book_and_tolerance() {
        let mut f = facts(0.53, 0.525);
        f.book = true;
        assert_eq!(label(&f), Label::Book);

        f.win_played = 0.45;
        f.loss = 0.08;
        assert_eq!(label(&f), Label::Inaccuracy);
    }

    #[test]
    fn test_great_in_critical_position() {
        let mut f = facts(0.60, 0.60);
        f.rank = Some(1);
        f.win_second = Some(0.30);
        assert_eq!(label(&f), Label::Great);

        // Small gap: plain best
        f.win_second = Some(0.55);
        assert_eq!(label(&f), Label::Best);

        // Only one candidate cannot be critical
        f.win_second = None;
        f.candidate_count = 1;
        assert_eq!(label(&f), Label::Best);

        // Second best move in a critical position is not Great
        let mut f = facts(0.60, 0.30);
        f.rank = Some(2);
        f.win_second = Some(0.30);
        assert_eq!(label(&f), Label::Blunder);
    }

    #[test]
    fn test_best_epsilon() {
        assert_eq!(label(&facts(0.50, 0.495)), Label::Best);
        assert_eq!(label(&facts(0.50, 0.47)), Label::Good);
    }

    #[test]
    fn test_miss_when_win_slips() {
        let mut f = facts(1.0, 0.70);
        f.best_score = Score::Mate(3);
        assert_eq!(label(&f), Label::Miss);

        let f = facts(0.95, 0.60);
        assert_eq!(label(&f), Label::Miss);

        // Still decisive after the move: bucketed instead
        let f = facts(0.97, 0.93);
        assert_eq!(label(&f), Label::Good);
    }

    #[test]
    fn test_buckets_scale_with_phase() {
        let mut f = facts(0.50, 0.43);
        assert_eq!(label(&f), Label::Inaccuracy);
        f.phase = Phase::Endgame;
        f.loss = 0.06;
        f.win_played = 0.44;
        assert_eq!(label(&f), Label::Good);

        assert_eq!(label(&facts(0.50, 0.35)), Label::Mistake);
        assert_eq!(label(&facts(0.50, 0.10)), Label::Blunder);
    }

    #[test]
    fn test_unranked_only_buckets() {
        let mut f = facts(0.60, 0.595);
        f.rank = None;
        f.book = true;
        assert_eq!(label(&f), Label::Good);

        let mut f = facts(0.95, 0.60);
        f.rank = None;
        assert_eq!(label(&f), Label::Blunder);
    }

    #[test]
    fn test_severity_monotonic_in_loss() {
        let config = ClassifierConfig::default();
        let mut previous = Label::Best;
        let mut loss = 0.05;
        while loss <= 0.30 + 1e-9 {
            let mut f = facts(0.55, 0.55 - loss);
            f.rank = Some(4);
            let current = classify_facts(&f, &config);
            assert!(current >= previous, "{current} after {previous} at loss {loss}");
            previous = current;
            loss += 0.01;
        }
        assert_eq!(previous, Label::Blunder);
    }

    #[test]
    fn test_lost_position_cap() {
        let config = ClassifierConfig::default();
        assert_eq!(move_loss(0.0, 0.0, Score::Mate(-2), &config), 0.0);
        assert!((move_loss(0.6, 0.1, Score::Cp(150), &config) - 0.5).abs() < 1e-9);
        assert!(move_loss(0.04, 0.0, Score::Cp(-800), &config) <= config.lost_floor);
        assert_eq!(move_loss(0.3, 0.5, Score::Cp(0), &config), 0.0);
    }

    #[test]
    fn test_labels_ordered_for_reporting() {
        let mut sorted = Label::ALL;
        sorted.sort();
        assert_eq!(sorted, Label::ALL);
        assert_eq!(serde_json::to_string(&Label::Inaccuracy).unwrap(), "\"inaccuracy\"");
    }
}
