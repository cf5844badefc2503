//! Per-ply classification and the whole-game review driver.

use std::sync::Arc;

use chess_core::game_data::GameData;
use chess_core::{Position, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::{classify_facts, is_lost, move_loss, Label, MoveFacts};
use crate::coach;
use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::eval::{accuracy_from_loss, win_probability, Perspective};
use crate::opening::{OpeningBook, OpeningInfo};
use crate::oracle::{CandidateMove, CandidateSet, Oracle};
use crate::phase::Phase;
use crate::record::{MoveFlags, MoveRecord};
use crate::sacrifice::{material_delta, needs_verification, verify_sacrifice, SacrificeCheck};
use crate::summary::{GameSummary, ReviewTally};

/// Everything known about one ply before classification.
#[derive(Debug, Clone)]
pub struct PlyInput {
    pub before: Position,
    /// Played move in UCI notation
    pub played: String,
    pub after: Position,
    /// Candidates at `before`, scores relative to the mover
    pub candidates: CandidateSet,
    pub move_number: u32,
    pub side: Side,
    /// Targeted evaluation of the played move at `before`, used when it
    /// is missing from the candidates
    pub played_eval: Option<CandidateMove>,
}

impl PlyInput {
    pub fn new(
        before: Position,
        played: impl Into<String>,
        after: Position,
        candidates: CandidateSet,
    ) -> Self {
        Self {
            move_number: before.fullmove_number(),
            side: before.side_to_move(),
            before,
            played: played.into(),
            after,
            candidates,
            played_eval: None,
        }
    }

    pub fn with_played_eval(mut self, eval: CandidateMove) -> Self {
        self.played_eval = Some(eval);
        self
    }

    fn validate(&self) -> Result<(), ReviewError> {
        self.candidates.validate(&self.before)?;
        if let Some(eval) = &self.played_eval {
            if eval.uci != self.played {
                return Err(ReviewError::MalformedInput(format!(
                    "targeted evaluation is for {}, played {}",
                    eval.uci, self.played
                )));
            }
        }
        if self.side != self.before.side_to_move() {
            return Err(ReviewError::MalformedInput(format!(
                "{} is not to move in {}",
                self.side,
                self.before.fen()
            )));
        }
        let expected = self
            .before
            .play_uci(&self.played)
            .map_err(|e| ReviewError::MalformedInput(e.to_string()))?;
        if expected.fingerprint() != self.after.fingerprint() {
            return Err(ReviewError::MalformedInput(format!(
                "{} does not lead from {} to {}",
                self.played,
                self.before.fen(),
                self.after.fen()
            )));
        }
        Ok(())
    }

    /// Record for a ply that could not be classified.
    pub fn unanalyzed(&self, reason: impl Into<String>) -> MoveRecord {
        let mut record = MoveRecord {
            ply: self.before.ply(),
            move_number: self.move_number,
            side: self.side,
            played: self.played.clone(),
            fen_before: self.before.fen().to_string(),
            rank: None,
            best_move: None,
            win_before: 0.0,
            win_after: 0.0,
            loss: 0.0,
            accuracy: 0.0,
            material_delta: 0,
            flags: MoveFlags::default(),
            phase: Phase::Middlegame,
            book: false,
            opening: None,
            label: None,
            explanation: String::new(),
            unanalyzed: Some(reason.into()),
        };
        record.explanation = coach::explain(&record);
        record
    }
}

/// Classify one ply. Malformed input becomes an unanalyzed record.
pub async fn classify<O: Oracle>(
    ply: &PlyInput,
    oracle: &mut O,
    config: &ReviewConfig,
    book: &OpeningBook,
) -> MoveRecord {
    match try_classify(ply, oracle, config, book).await {
        Ok(record) => record,
        Err(e) => {
            warn!(ply = ply.before.ply(), played = %ply.played, error = %e, "Ply not analyzed");
            ply.unanalyzed(e.to_string())
        }
    }
}

async fn try_classify<O: Oracle>(
    ply: &PlyInput,
    oracle: &mut O,
    config: &ReviewConfig,
    book: &OpeningBook,
) -> Result<MoveRecord, ReviewError> {
    ply.validate()?;
    let thresholds = &config.classifier;
    let k = thresholds.sigmoid_k;

    let best = ply
        .candidates
        .best()
        .ok_or_else(|| ReviewError::MalformedInput("empty candidate set".into()))?;
    let listed = ply.candidates.find(&ply.played);
    let rank = listed.map(|c| c.rank);
    let played = listed.or(ply.played_eval.as_ref());

    let delivers_mate = ply.after.is_checkmate();
    let phase = Phase::detect(&ply.before, thresholds);
    let win_best = win_probability(best.score, Perspective::Mover, k);
    let win_second = ply
        .candidates
        .second()
        .map(|c| win_probability(c.score, Perspective::Mover, k));
    // Unlisted and unevaluated moves rank below the last candidate and
    // never inside the Good bucket
    let unlisted_floor = thresholds.good_max * phase.threshold_scale(thresholds);
    let win_played = if delivers_mate {
        1.0
    } else if let Some(played) = played {
        win_probability(played.score, Perspective::Mover, k)
    } else {
        let last = ply.candidates.last().unwrap_or(best);
        let win_last = win_probability(last.score, Perspective::Mover, k);
        (win_best - (win_best - win_last).max(unlisted_floor)).max(0.0)
    };

    let mut loss = move_loss(win_best, win_played, best.score, thresholds);
    if played.is_none() && !delivers_mate && !is_lost(win_best, best.score, thresholds) {
        loss = loss.max(unlisted_floor);
    }
    let pv = played.map(|c| c.pv.as_slice()).unwrap_or(&[]);
    let delta = material_delta(&ply.before, &ply.played, pv, thresholds.material_horizon_plies)?;
    let opening = book
        .book_move(&ply.after, ply.move_number, thresholds.book_max_fullmove)
        .cloned();

    let sacrifice = if rank.is_some() && !delivers_mate && needs_verification(delta, win_played, thresholds) {
        verify_sacrifice(oracle, &ply.after, &config.search, thresholds).await
    } else {
        SacrificeCheck::NotApplicable
    };

    let facts = MoveFacts {
        rank,
        candidate_count: ply.candidates.len(),
        best_score: best.score,
        win_best,
        win_second,
        win_played,
        loss,
        material_delta: delta,
        sacrifice,
        book: opening.is_some(),
        delivers_mate,
        phase,
    };
    let label = classify_facts(&facts, thresholds);

    let played_score = played.map(|c| c.score);
    let flags = MoveFlags {
        mate_threat: played_score.is_some_and(|s| s.is_mate_against()) && !delivers_mate,
        mate_delivered: delivers_mate,
        mate_missed: best.score.is_mate_for()
            && !delivers_mate
            && !played_score.is_some_and(|s| s.is_mate_for()),
        check: ply.after.is_check(),
        critical: facts.is_critical(thresholds),
        sacrifice,
    };

    let mut record = MoveRecord {
        ply: ply.before.ply(),
        move_number: ply.move_number,
        side: ply.side,
        played: ply.played.clone(),
        fen_before: ply.before.fen().to_string(),
        rank,
        best_move: Some(best.uci.clone()),
        win_before: win_best,
        win_after: win_played,
        loss,
        accuracy: accuracy_from_loss(loss, thresholds.accuracy_decay),
        material_delta: delta,
        flags,
        phase,
        book: facts.book,
        opening,
        label: Some(label),
        explanation: String::new(),
        unanalyzed: None,
    };
    record.explanation = coach::explain(&record);

    debug!(
        ply = record.ply,
        played = %record.played,
        label = %label,
        loss = record.loss,
        delta = record.material_delta,
        "Classified move"
    );
    Ok(record)
}

/// Complete review of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReview {
    pub moves: Vec<MoveRecord>,
    pub summary: GameSummary,
}

/// Drives the oracle and the classifier over a whole game.
pub struct Reviewer<O: Oracle> {
    oracle: O,
    config: ReviewConfig,
    book: Arc<OpeningBook>,
}

impl<O: Oracle> Reviewer<O> {
    pub fn new(oracle: O, config: ReviewConfig, book: Arc<OpeningBook>) -> Self {
        Self { oracle, config, book }
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    pub async fn classify(&mut self, ply: &PlyInput) -> MoveRecord {
        classify(ply, &mut self.oracle, &self.config, &self.book).await
    }

    /// Review every ply of `game` in order.
    ///
    /// Fails only if the game itself does not replay. Oracle failures turn
    /// into unanalyzed records.
    pub async fn review_game(&mut self, game: &GameData) -> Result<GameReview, ReviewError> {
        let plies = game.replay()?;
        let search = self.config.search.clone();
        info!(
            white = %game.metadata.white,
            black = %game.metadata.black,
            plies = plies.len(),
            depth = search.depth,
            "Reviewing game"
        );

        let mut tally = ReviewTally::new(&self.config.classifier);
        let mut moves = Vec::with_capacity(plies.len());

        for played in plies {
            let candidates = match self
                .oracle
                .evaluate(&played.before, search.multipv, search.depth)
                .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(ply = played.before.ply(), error = %e, "Candidate request failed");
                    let ply = PlyInput::new(played.before, played.uci, played.after, CandidateSet::default());
                    let record = ply.unanalyzed(format!("oracle unavailable: {e}"));
                    tally = tally.aggregate(&record);
                    moves.push(record);
                    continue;
                }
            };

            let mut ply = PlyInput::new(played.before, played.uci, played.after, candidates);
            if ply.candidates.find(&ply.played).is_none() {
                match self
                    .oracle
                    .evaluate_move(&ply.before, &ply.played, search.depth)
                    .await
                {
                    Ok(eval) => ply.played_eval = Some(eval),
                    Err(e) => debug!(played = %ply.played, error = %e, "No targeted evaluation"),
                }
            }

            let record = self.classify(&ply).await;
            tally = tally.aggregate(&record);
            moves.push(record);
        }

        let folded = tally.moves_folded();
        let mut summary = tally.finish(game.metadata.result.clone());
        if summary.opening.is_none() {
            summary.opening = OpeningInfo::from_metadata(&game.metadata);
        }
        info!(
            moves = folded,
            opening = ?summary.opening.as_ref().map(|o| &o.name),
            white_accuracy = ?summary.white.accuracy,
            black_accuracy = ?summary.black.accuracy,
            "Review finished"
        );
        Ok(GameReview { moves, summary })
    }
}
