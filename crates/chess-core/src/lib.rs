pub mod error;
pub mod game_data;
pub mod pgn;
pub mod position;

pub use error::ChessError;
pub use position::{Material, Position, Side, START_FEN};
