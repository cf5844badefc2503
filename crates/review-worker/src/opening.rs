//! Opening recognizer: position fingerprint -> (ECO, name).
//!
//! The built-in table is defined as SAN move lines and fingerprinted once at
//! first access by replaying them. A bincode file with the same layout can
//! replace it (see the `export-openings` binary).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use chess_core::game_data::GameMetadata;
use chess_core::Position;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ReviewError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningInfo {
    pub eco: String,
    pub name: String,
}

impl OpeningInfo {
    /// Opening named by the PGN `ECO`/`Opening` headers, if any.
    pub fn from_metadata(metadata: &GameMetadata) -> Option<Self> {
        let header = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        match (header(&metadata.eco), header(&metadata.opening)) {
            (None, None) => None,
            (eco, name) => Some(Self {
                name: name.or_else(|| eco.clone()).unwrap_or_default(),
                eco: eco.unwrap_or_else(|| "?".to_string()),
            }),
        }
    }
}

/// (ECO, name, SAN line reaching the named position)
const BUILTIN_LINES: &[(&str, &str, &str)] = &[
    ("A00", "Start Position", ""),
    // First moves
    ("B00", "King's Pawn Opening", "e4"),
    ("D00", "Queen's Pawn Opening", "d4"),
    ("A04", "Réti Opening", "Nf3"),
    ("A10", "English Opening", "c4"),
    ("A02", "Bird's Opening", "f4"),
    ("A01", "Nimzo-Larsen Attack", "b3"),
    ("A00", "Hungarian Opening", "g3"),
    // 1.e4 replies
    ("C00", "French Defence", "e4 e6"),
    ("B10", "Caro-Kann Defence", "e4 c6"),
    ("B20", "Sicilian Defence", "e4 c5"),
    ("C20", "King's Pawn Game", "e4 e5"),
    ("B01", "Scandinavian Defence", "e4 d5"),
    ("B02", "Alekhine's Defence", "e4 Nf6"),
    ("B00", "Nimzowitsch Defence", "e4 Nc6"),
    ("B07", "Pirc Defence", "e4 d6"),
    ("B06", "Modern Defence", "e4 g6"),
    // Sicilian
    ("B27", "Sicilian Defence: Knight Variation", "e4 c5 Nf3"),
    ("B29", "Sicilian Defence: Nimzowitsch-Rubinstein", "e4 c5 Nf3 Nf6"),
    ("B23", "Sicilian Defence: Closed", "e4 c5 Nc3"),
    ("B22", "Sicilian Defence: Alapin Variation", "e4 c5 c3"),
    ("B21", "Sicilian Defence: Smith-Morra Gambit", "e4 c5 d4"),
    ("B50", "Sicilian Defence: Open", "e4 c5 Nf3 d6 d4 cxd4 Nxd4 Nf6 Nc3"),
    ("B90", "Sicilian Defence: Najdorf Variation", "e4 c5 Nf3 d6 d4 cxd4 Nxd4 Nf6 Nc3 a6"),
    ("B70", "Sicilian Defence: Dragon Variation", "e4 c5 Nf3 d6 d4 cxd4 Nxd4 Nf6 Nc3 g6"),
    // Open games
    ("C40", "King's Knight Opening", "e4 e5 Nf3"),
    ("C42", "Petrov's Defence", "e4 e5 Nf3 Nf6"),
    ("C41", "Philidor Defence", "e4 e5 Nf3 d6"),
    ("C44", "King's Knight Opening: Normal Variation", "e4 e5 Nf3 Nc6"),
    ("C46", "Three Knights Game", "e4 e5 Nf3 Nc6 Nc3"),
    ("C47", "Four Knights Game", "e4 e5 Nf3 Nc6 Nc3 Nf6"),
    ("C45", "Scotch Game", "e4 e5 Nf3 Nc6 d4"),
    ("C60", "Ruy Lopez", "e4 e5 Nf3 Nc6 Bb5"),
    ("C50", "Italian Game", "e4 e5 Nf3 Nc6 Bc4"),
    ("C55", "Two Knights Defence", "e4 e5 Nf3 Nc6 Bc4 Nf6"),
    ("C30", "King's Gambit", "e4 e5 f4"),
    ("C25", "Vienna Game", "e4 e5 Nc3"),
    ("C23", "Bishop's Opening", "e4 e5 Bc4"),
    // French
    ("C01", "French Defence: Exchange Variation", "e4 e6 d4 d5 exd5"),
    ("C10", "French Defence: Paulsen Variation", "e4 e6 d4 d5 Nc3"),
    // Closed games
    ("D00", "Queen's Pawn Game", "d4 d5"),
    ("D06", "Queen's Gambit", "d4 d5 c4"),
    ("D02", "London System", "d4 d5 Bf4"),
    ("D10", "Slav Defence", "d4 d5 c4 c6"),
    ("D30", "Queen's Gambit Declined", "d4 d5 c4 e6"),
    ("D20", "Queen's Gambit Accepted", "d4 d5 c4 dxc4"),
    // Indian systems
    ("A45", "Indian Game", "d4 Nf6"),
    ("E00", "Indian Game: Normal Variation", "d4 Nf6 c4"),
    ("D00", "Richter-Veresov Attack", "d4 Nf6 Nc3"),
    ("A46", "Indian Game: Knights Variation", "d4 Nf6 Nf3"),
    ("E00", "Catalan Opening", "d4 Nf6 c4 e6 g3"),
    ("E11", "Bogo-Indian Defence", "d4 Nf6 c4 e6 Nf3 Bb4+"),
    ("E12", "Queen's Indian Defence", "d4 Nf6 c4 e6 Nf3 b6"),
    ("E20", "Nimzo-Indian Defence", "d4 Nf6 c4 e6 Nc3 Bb4"),
    ("E60", "King's Indian Defence", "d4 Nf6 c4 g6"),
    ("D80", "Grünfeld Defence", "d4 Nf6 c4 g6 Nc3 d5"),
    ("A43", "Old Benoni", "d4 c5"),
    ("A80", "Dutch Defence", "d4 f5"),
    // English
    ("A30", "English Opening: Symmetrical Variation", "c4 c5"),
    ("A20", "English Opening: King's English", "c4 e5"),
];

/// Immutable fingerprint -> opening map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpeningBook {
    entries: HashMap<String, OpeningInfo>,
}

/// Built-in table, fingerprinted on first access.
pub static BUILTIN_BOOK: LazyLock<Arc<OpeningBook>> = LazyLock::new(|| {
    let book = OpeningBook::builtin();
    info!(positions = book.len(), "Built-in opening table ready");
    Arc::new(book)
});

impl OpeningBook {
    /// Replay every built-in line. A line that fails to replay is skipped
    /// with a warning.
    pub fn builtin() -> Self {
        let mut entries = HashMap::with_capacity(BUILTIN_LINES.len());
        for (eco, name, line) in BUILTIN_LINES {
            match replay_line(line) {
                Ok(position) => {
                    entries.insert(
                        position.fingerprint(),
                        OpeningInfo {
                            eco: (*eco).to_string(),
                            name: (*name).to_string(),
                        },
                    );
                }
                Err(e) => warn!(eco, name, error = %e, "Skipping opening line"),
            }
        }
        Self { entries }
    }

    /// Load a bincode table from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReviewError> {
        let reader = BufReader::new(File::open(path)?);
        let book: OpeningBook = bincode::deserialize_from(reader)?;
        Ok(book)
    }

    /// Use the file at `path` when given and readable, otherwise the built-in table.
    pub fn load_or_builtin(path: Option<&Path>) -> Arc<Self> {
        let Some(path) = path else {
            return BUILTIN_BOOK.clone();
        };
        match Self::load(path) {
            Ok(book) => {
                info!(path = %path.display(), positions = book.len(), "Loaded opening table");
                Arc::new(book)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load opening table, using built-in");
                BUILTIN_BOOK.clone()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ReviewError> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, position: &Position) -> Option<&OpeningInfo> {
        self.entries.get(&position.fingerprint())
    }

    /// Book move: the position reached is in the table and the move was
    /// made within the first `max_fullmove` full moves.
    pub fn book_move(
        &self,
        after: &Position,
        move_number: u32,
        max_fullmove: u32,
    ) -> Option<&OpeningInfo> {
        if move_number > max_fullmove {
            return None;
        }
        self.lookup(after)
    }
}

fn replay_line(line: &str) -> Result<Position, ReviewError> {
    let mut position = Position::default();
    for san in line.split_whitespace() {
        let (next, _) = position.play_san(san)?;
        position = next;
    }
    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lines_all_replay() {
        let book = OpeningBook::builtin();
        for (_, name, line) in BUILTIN_LINES {
            assert!(replay_line(line).is_ok(), "{name} does not replay");
        }
        assert!(book.len() > 50);
    }

    #[test]
    fn test_lookup_by_fingerprint() {
        let book = OpeningBook::builtin();
        let after_e4 = Position::default().play_uci("e2e4").unwrap();
        let info = book.lookup(&after_e4).unwrap();
        assert_eq!(info.eco, "B00");

        // Same placement with different counters still matches
        let counters =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 4 12")
                .unwrap();
        assert_eq!(book.lookup(&counters), Some(info));
    }

    #[test]
    fn test_opening_from_headers() {
        let mut metadata = GameMetadata::default();
        assert_eq!(OpeningInfo::from_metadata(&metadata), None);

        metadata.eco = Some("C50".to_string());
        metadata.opening = Some("Italian Game".to_string());
        let info = OpeningInfo::from_metadata(&metadata).unwrap();
        assert_eq!((info.eco.as_str(), info.name.as_str()), ("C50", "Italian Game"));

        metadata.opening = Some("  ".to_string());
        assert_eq!(OpeningInfo::from_metadata(&metadata).unwrap().name, "C50");
    }

    #[test]
    fn test_book_window() {
        let book = OpeningBook::builtin();
        let ruy = replay_line("e4 e5 Nf3 Nc6 Bb5").unwrap();
        assert_eq!(book.book_move(&ruy, 3, 5).map(|o| o.name.as_str()), Some("Ruy Lopez"));
        assert!(book.book_move(&ruy, 5, 5).is_some());
        assert!(book.book_move(&ruy, 6, 5).is_none());
        assert!(book.book_move(&ruy, 12, 5).is_none());

        let odd = Position::default().play_uci("h2h4").unwrap();
        assert!(book.book_move(&odd, 1, 5).is_none());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("openings-{}.bin", std::process::id()));
        let book = OpeningBook::builtin();
        book.save(&path).unwrap();
        let loaded = OpeningBook::load(&path).unwrap();
        assert_eq!(loaded.len(), book.len());
        std::fs::remove_file(&path).ok();

        let fallback = OpeningBook::load_or_builtin(Some(Path::new("/nonexistent/openings.bin")));
        assert_eq!(fallback.len(), BUILTIN_BOOK.len());
    }
}
