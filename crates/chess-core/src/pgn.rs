//! PGN parsing utilities: lightweight regex-based parser.
//!
//! Only the mainline is kept: comments, variations and NAGs are dropped.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ChessError;
use crate::game_data::{GameData, GameMetadata};
use crate::position::START_FEN;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("header regex"));
static HEADER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("header line regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}|;[^\n]*").expect("comment regex"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("variation regex"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?")
        .expect("move regex")
});

/// Parse a single-game PGN string into headers and SAN mainline.
pub fn parse_pgn(pgn: &str) -> Result<GameData, ChessError> {
    let mut metadata = GameMetadata {
        white: "White".to_string(),
        black: "Black".to_string(),
        result: "*".to_string(),
        ..GameMetadata::default()
    };
    let mut setup = false;

    for cap in HEADER_RE.captures_iter(pgn) {
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Date" => metadata.date = Some(value),
            "Event" => metadata.event = Some(value),
            "ECO" => metadata.eco = Some(value),
            "Opening" => metadata.opening = Some(value),
            "SetUp" => setup = value == "1",
            "FEN" => metadata.start_fen = Some(value),
            _ => {}
        }
    }

    // A FEN header only counts when it differs from the standard start
    if !setup || metadata.start_fen.as_deref() == Some(START_FEN) {
        metadata.start_fen = None;
    }

    let moves = extract_moves(pgn);
    if moves.is_empty() {
        return Err(ChessError::EmptyGame);
    }

    Ok(GameData { metadata, moves })
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_LINE_RE.replace_all(pgn, "");
    let mut text = COMMENT_RE.replace_all(&no_headers, "").into_owned();

    // Nested variations: strip innermost first until none remain
    while VARIATION_RE.is_match(&text) {
        text = VARIATION_RE.replace_all(&text, "").into_owned();
    }

    MOVE_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pgn_basic() {
        let pgn = r#"[White "Player1"]
[Black "Player2"]
[Result "1-0"]
[Date "2025.01.15"]
[ECO "C20"]

1. e4 e5 2. Nf3 Nc6 1-0"#;

        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.metadata.white, "Player1");
        assert_eq!(game.metadata.black, "Player2");
        assert_eq!(game.metadata.result, "1-0");
        assert_eq!(game.metadata.eco.as_deref(), Some("C20"));
        assert_eq!(game.moves, vec!["e4", "e5", "Nf3", "Nc6"]);
        assert!(game.metadata.start_fen.is_none());
    }

    #[test]
    fn test_strips_comments_and_variations() {
        let pgn = "1. e4 {best by test} e5 (1... c5 2. Nf3 (2. c3 d5)) 2. Bc4 ; trap\n2... Nc6 3. Qh5 Nf6?? 4. Qxf7# 1-0";
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(
            game.moves,
            vec!["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"]
        );
        assert_eq!(game.replay().unwrap().len(), 7);
    }

    #[test]
    fn test_custom_start_and_empty() {
        let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"]

1. e4 Kd7 *"#;
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.metadata.start_fen.as_deref(), Some("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"));
        assert_eq!(game.replay().unwrap().len(), 2);

        assert!(matches!(parse_pgn("[White \"x\"]\n*"), Err(ChessError::EmptyGame)));
    }
}
