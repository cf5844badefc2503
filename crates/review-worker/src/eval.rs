//! Evaluation normalization, pure functions only.
//!
//! Engine scores are relative to the side to move in the evaluated position
//! (UCI convention). Everything downstream works on the probability that the
//! mover, the side that just played, is winning.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReviewError;

/// Raw engine score, relative to the side to move in the evaluated position.
/// `Mate(0)` means that side is already checkmated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Cp(i32),
    Mate(i32),
}

/// Whose point of view a score was reported from, relative to the mover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    /// Candidate scores at the position before the move
    Mover,
    /// Evaluations of the position after the move
    Opponent,
}

impl Score {
    /// Build a score from an engine report. A mate value takes precedence.
    pub fn from_raw(cp: Option<i32>, mate: Option<i32>) -> Result<Score, ReviewError> {
        match (cp, mate) {
            (_, Some(m)) => Ok(Score::Mate(m)),
            (Some(c), None) => Ok(Score::Cp(c)),
            (None, None) => Err(ReviewError::MalformedInput(
                "score has neither cp nor mate".into(),
            )),
        }
    }

    /// Forced mate for the side the score is relative to
    pub fn is_mate_for(self) -> bool {
        matches!(self, Score::Mate(n) if n > 0)
    }

    /// Forced mate against the side the score is relative to
    pub fn is_mate_against(self) -> bool {
        matches!(self, Score::Mate(n) if n <= 0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Cp(cp) => write!(f, "{:+.2}", *cp as f64 / 100.0),
            Score::Mate(n) if *n > 0 => write!(f, "+M{n}"),
            Score::Mate(n) => write!(f, "-M{}", n.abs()),
        }
    }
}

/// Probability in [0, 1] that the mover is winning.
///
/// Centipawns go through a logistic curve, so large advantages saturate
/// toward 0/1. Mates map straight to 1.0 or 0.0 whatever the distance.
pub fn win_probability(score: Score, perspective: Perspective, sigmoid_k: f64) -> f64 {
    let p = match score {
        Score::Cp(cp) => 1.0 / (1.0 + (-sigmoid_k * cp as f64).exp()),
        Score::Mate(n) if n > 0 => 1.0,
        Score::Mate(_) => 0.0,
    };
    match perspective {
        Perspective::Mover => p,
        Perspective::Opponent => 1.0 - p,
    }
}

/// Per-move accuracy in [0, 100], strictly decreasing in loss.
pub fn accuracy_from_loss(loss: f64, accuracy_decay: f64) -> f64 {
    100.0 * (-accuracy_decay * loss.clamp(0.0, 1.0)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    const K: f64 = 0.00368;

    #[test]
    fn test_probability_bounds_and_symmetry() {
        for cp in [-3000, -600, -35, 0, 35, 600, 3000] {
            let mover = win_probability(Score::Cp(cp), Perspective::Mover, K);
            let opponent = win_probability(Score::Cp(cp), Perspective::Opponent, K);
            assert!((0.0..=1.0).contains(&mover));
            assert!((mover + opponent - 1.0).abs() < 1e-9);

            let flipped = win_probability(Score::Cp(-cp), Perspective::Mover, K);
            assert!((mover + flipped - 1.0).abs() < 1e-9);
        }
        for m in [-3, 0, 1, 7] {
            let mover = win_probability(Score::Mate(m), Perspective::Mover, K);
            let opponent = win_probability(Score::Mate(m), Perspective::Opponent, K);
            assert!((mover + opponent - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_saturation() {
        assert!((win_probability(Score::Cp(0), Perspective::Mover, K) - 0.5).abs() < 1e-9);
        assert!(win_probability(Score::Cp(600), Perspective::Mover, K) > 0.9);
        assert!(win_probability(Score::Cp(-600), Perspective::Mover, K) < 0.1);
        assert!(win_probability(Score::Cp(2000), Perspective::Mover, K) > 0.99);
    }

    #[test]
    fn test_mate_scores() {
        assert_eq!(win_probability(Score::Mate(12), Perspective::Mover, K), 1.0);
        assert_eq!(win_probability(Score::Mate(-1), Perspective::Mover, K), 0.0);
        assert_eq!(win_probability(Score::Mate(0), Perspective::Mover, K), 0.0);
        assert_eq!(win_probability(Score::Mate(0), Perspective::Opponent, K), 1.0);
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(Score::from_raw(Some(35), None).unwrap(), Score::Cp(35));
        assert_eq!(Score::from_raw(Some(35), Some(3)).unwrap(), Score::Mate(3));
        assert!(matches!(
            Score::from_raw(None, None),
            Err(ReviewError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_accuracy_strictly_decreasing() {
        let mut previous = accuracy_from_loss(0.0, 4.354);
        assert!((previous - 100.0).abs() < 1e-9);
        for step in 1..=100 {
            let acc = accuracy_from_loss(step as f64 / 100.0, 4.354);
            assert!(acc < previous);
            assert!(acc > 0.0);
            previous = acc;
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Score::Cp(35).to_string(), "+0.35");
        assert_eq!(Score::Cp(-120).to_string(), "-1.20");
        assert_eq!(Score::Mate(3).to_string(), "+M3");
        assert_eq!(Score::Mate(-2).to_string(), "-M2");
    }
}
