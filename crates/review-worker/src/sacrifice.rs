//! Material accounting and deep verification of sacrifices.

use chess_core::Position;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::{ClassifierConfig, SearchConfig};
use crate::error::{OracleError, ReviewError};
use crate::eval::{win_probability, Perspective};
use crate::oracle::Oracle;

/// Outcome of the deeper re-evaluation of a material-losing move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SacrificeCheck {
    /// No sacrifice, or the move was not worth verifying
    #[default]
    NotApplicable,
    Sound,
    Unsound,
    /// Oracle failed or timed out; treated as unsound
    Failed,
}

impl SacrificeCheck {
    pub fn is_sound(self) -> bool {
        self == SacrificeCheck::Sound
    }
}

/// Change of the mover's material balance (pawn units) over the forcing
/// sequence started by `played`.
///
/// `pv` is followed past the played move while its moves are captures, for
/// at most `horizon` plies in total. A PV that does not start with the
/// played move is ignored.
pub fn material_delta(
    before: &Position,
    played: &str,
    pv: &[String],
    horizon: usize,
) -> Result<i32, ReviewError> {
    let mover = before.side_to_move();
    let start = before.material_balance(mover);

    let mut position = before.play_uci(played)?;
    if pv.first().map(String::as_str) == Some(played) {
        for uci in pv.iter().skip(1).take(horizon.saturating_sub(1)) {
            if !position.is_capture_uci(uci) {
                break;
            }
            match position.play_uci(uci) {
                Ok(next) => position = next,
                Err(_) => break,
            }
        }
    }

    Ok(position.material_balance(mover) - start)
}

/// A move gives up enough material while still looking winning.
pub fn needs_verification(material_delta: i32, win_after: f64, config: &ClassifierConfig) -> bool {
    material_delta <= -config.sacrifice_min_material && win_after >= config.winning_cutoff
}

/// Re-search the position after the sacrifice deeper and wider.
///
/// Sound only if the deeper best line still gives the mover at least the
/// winning cutoff. Failures and timeouts never propagate.
pub async fn verify_sacrifice<O: Oracle>(
    oracle: &mut O,
    after: &Position,
    search: &SearchConfig,
    config: &ClassifierConfig,
) -> SacrificeCheck {
    let depth = search.verify_depth();
    let result = match timeout(
        search.verify_timeout,
        oracle.evaluate(after, search.verify_multipv, depth),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(OracleError::Timeout(search.verify_timeout)),
    };

    match result {
        Ok(candidates) => match candidates.best() {
            Some(top) => {
                // Scores at `after` are from the opponent's side
                let p = win_probability(top.score, Perspective::Opponent, config.sigmoid_k);
                debug!(fen = after.fen(), depth, score = %top.score, p, "Sacrifice re-evaluated");
                if p >= config.winning_cutoff {
                    SacrificeCheck::Sound
                } else {
                    SacrificeCheck::Unsound
                }
            }
            None => {
                warn!(fen = after.fen(), "Sacrifice verification returned no lines");
                SacrificeCheck::Failed
            }
        },
        Err(e) => {
            warn!(fen = after.fen(), error = %e, "Sacrifice verification failed");
            SacrificeCheck::Failed
        }
    }
}
