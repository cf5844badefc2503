//! Chess move review: classifies every move of a game from engine
//! evaluations and folds the results into per-player statistics.

pub mod classifier;
pub mod coach;
pub mod config;
pub mod error;
pub mod eval;
pub mod opening;
pub mod oracle;
pub mod phase;
pub mod record;
pub mod review;
pub mod sacrifice;
pub mod stockfish;
pub mod summary;

pub use classifier::Label;
pub use config::{ClassifierConfig, ReviewConfig, SearchConfig, WorkerConfig};
pub use error::{OracleError, ReviewError};
pub use eval::{Perspective, Score};
pub use opening::{OpeningBook, OpeningInfo};
pub use oracle::{CandidateMove, CandidateSet, Oracle};
pub use record::{MoveFlags, MoveRecord};
pub use review::{classify, GameReview, PlyInput, Reviewer};
pub use summary::{GameSummary, PlayerSummary, ReviewTally};
