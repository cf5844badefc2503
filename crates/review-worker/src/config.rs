//! Review configuration: classification policy constants and worker settings
//! from environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ReviewError;

/// Policy constants for the classification pipeline.
///
/// Probabilities and losses are on the [0, 1] win-probability scale,
/// material is in pawn units. Every field has a default so a thresholds
/// file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Sigmoid slope for centipawn -> win probability
    pub sigmoid_k: f64,
    /// Accuracy = 100 * exp(-accuracy_decay * loss)
    pub accuracy_decay: f64,

    /// Win probability at which the mover counts as winning
    pub winning_cutoff: f64,
    /// Minimum material given up (pawn units) before a move is a sacrifice
    pub sacrifice_min_material: i32,
    /// Forcing plies followed along a PV when measuring material delta
    pub material_horizon_plies: usize,

    /// Last full move on which a book position still counts as book
    pub book_max_fullmove: u32,
    pub book_tolerance: f64,
    pub best_epsilon: f64,

    /// Best-vs-second gap that makes a position critical
    pub critical_gap: f64,
    /// Best candidate must be at least this good for a critical position
    pub near_equal_floor: f64,
    pub decisive_threshold: f64,
    pub lost_floor: f64,

    // Loss bucket upper bounds, before phase scaling
    pub good_max: f64,
    pub inaccuracy_max: f64,
    pub mistake_max: f64,

    pub opening_max_fullmove: u32,
    pub opening_min_piece_material: i32,
    pub endgame_piece_material: i32,
    pub opening_threshold_scale: f64,
    pub middlegame_threshold_scale: f64,
    pub endgame_threshold_scale: f64,

    // Game aggregate accuracy weighting
    pub lapse_damping: f64,
    pub recency_decay: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sigmoid_k: 0.00368,
            accuracy_decay: 4.354,
            winning_cutoff: 0.55,
            sacrifice_min_material: 2,
            material_horizon_plies: 6,
            book_max_fullmove: 5,
            book_tolerance: 0.02,
            best_epsilon: 0.01,
            critical_gap: 0.20,
            near_equal_floor: 0.45,
            decisive_threshold: 0.90,
            lost_floor: 0.05,
            good_max: 0.05,
            inaccuracy_max: 0.10,
            mistake_max: 0.20,
            opening_max_fullmove: 10,
            opening_min_piece_material: 52,
            endgame_piece_material: 14,
            opening_threshold_scale: 1.0,
            middlegame_threshold_scale: 1.0,
            endgame_threshold_scale: 1.3,
            lapse_damping: 1.0,
            recency_decay: 0.98,
        }
    }
}

impl ClassifierConfig {
    /// Load overrides from a JSON file and validate the result.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ReviewError> {
        let text = fs::read_to_string(path)?;
        let config: ClassifierConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would break the ordering of the loss
    /// buckets or leave the probability scale.
    pub fn validate(&self) -> Result<(), ReviewError> {
        let probabilities = [
            ("winning_cutoff", self.winning_cutoff),
            ("book_tolerance", self.book_tolerance),
            ("best_epsilon", self.best_epsilon),
            ("critical_gap", self.critical_gap),
            ("near_equal_floor", self.near_equal_floor),
            ("decisive_threshold", self.decisive_threshold),
            ("lost_floor", self.lost_floor),
            ("good_max", self.good_max),
            ("inaccuracy_max", self.inaccuracy_max),
            ("mistake_max", self.mistake_max),
        ];
        for (name, value) in probabilities {
            if !(value > 0.0 && value < 1.0) {
                return Err(ReviewError::Config(format!("{name} must be in (0, 1), got {value}")));
            }
        }

        if !(self.best_epsilon < self.good_max
            && self.good_max < self.inaccuracy_max
            && self.inaccuracy_max < self.mistake_max)
        {
            return Err(ReviewError::Config(
                "loss thresholds must increase: best_epsilon < good_max < inaccuracy_max < mistake_max".into(),
            ));
        }

        for (name, value) in [
            ("sigmoid_k", self.sigmoid_k),
            ("accuracy_decay", self.accuracy_decay),
            ("opening_threshold_scale", self.opening_threshold_scale),
            ("middlegame_threshold_scale", self.middlegame_threshold_scale),
            ("endgame_threshold_scale", self.endgame_threshold_scale),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ReviewError::Config(format!("{name} must be positive, got {value}")));
            }
        }

        // Above 1 a worse move can raise the weighted mean
        if !(self.lapse_damping > 0.0 && self.lapse_damping <= 1.0) {
            return Err(ReviewError::Config(format!(
                "lapse_damping must be in (0, 1], got {}",
                self.lapse_damping
            )));
        }

        if !(self.recency_decay > 0.0 && self.recency_decay <= 1.0) {
            return Err(ReviewError::Config(format!(
                "recency_decay must be in (0, 1], got {}",
                self.recency_decay
            )));
        }

        if self.sacrifice_min_material <= 0 {
            return Err(ReviewError::Config("sacrifice_min_material must be positive".into()));
        }

        Ok(())
    }
}

/// Oracle search settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Depth for the per-ply candidate request
    pub depth: u32,
    /// Candidates requested per position
    pub multipv: u32,
    /// Extra plies for sacrifice verification
    pub verify_depth_extra: u32,
    pub verify_multipv: u32,
    pub verify_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 12,
            multipv: 5,
            verify_depth_extra: 4,
            verify_multipv: 2,
            verify_timeout: Duration::from_secs(10),
        }
    }
}

impl SearchConfig {
    pub fn verify_depth(&self) -> u32 {
        self.depth + self.verify_depth_extra
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewConfig {
    pub classifier: ClassifierConfig,
    pub search: SearchConfig,
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Optional bincode opening table replacing the built-in one
    pub opening_book_path: Option<PathBuf>,

    pub review: ReviewConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ReviewError> {
        let stockfish_path = env::var("STOCKFISH_PATH")
            .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string());

        let opening_book_path = env::var("OPENING_BOOK_PATH").ok().map(PathBuf::from);

        let defaults = SearchConfig::default();
        let search = SearchConfig {
            depth: env_parse("ANALYSIS_DEPTH").unwrap_or(defaults.depth),
            multipv: env_parse("MULTI_PV").unwrap_or(defaults.multipv),
            verify_depth_extra: env_parse("VERIFY_DEPTH_EXTRA")
                .unwrap_or(defaults.verify_depth_extra),
            verify_multipv: env_parse("VERIFY_MULTI_PV").unwrap_or(defaults.verify_multipv),
            verify_timeout: env_parse("VERIFY_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.verify_timeout),
        };

        if search.depth == 0 || search.multipv == 0 {
            return Err(ReviewError::Config(
                "ANALYSIS_DEPTH and MULTI_PV must be positive".into(),
            ));
        }

        let classifier = match env::var("THRESHOLDS_PATH") {
            Ok(path) => {
                info!(path = %path, "Loading classification thresholds");
                ClassifierConfig::from_json_file(&path)?
            }
            Err(_) => ClassifierConfig::default(),
        };

        Ok(Self {
            stockfish_path,
            opening_book_path,
            review: ReviewConfig { classifier, search },
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
