//! Explanation text for classified moves. Deterministic templates, no I/O.

use crate::classifier::Label;
use crate::phase::Phase;
use crate::record::MoveRecord;
use crate::sacrifice::SacrificeCheck;

/// Material given up before a blunder reads as a hung piece
const HUNG_PIECE_MATERIAL: i32 = 3;

pub fn explain(record: &MoveRecord) -> String {
    let Some(label) = record.label else {
        let reason = record.unanalyzed.as_deref().unwrap_or("no evaluation available");
        return format!("This move could not be analyzed: {reason}.");
    };

    if record.flags.mate_delivered {
        return "Checkmate! The game is over.".to_string();
    }

    let best = record.best_move.as_deref().unwrap_or("the engine's choice");
    let swing = percent(record.loss);

    let mut text = match label {
        Label::Brilliant => format!(
            "Brilliant! You gave up {} points of material and the position is still winning.",
            -record.material_delta
        ),
        Label::Great => "You found the only move that saves the position!".to_string(),
        Label::Best if record.rank == Some(1) => "The best move in the position.".to_string(),
        Label::Best => format!("An excellent move, practically as strong as {best}."),
        Label::Book => match &record.opening {
            Some(opening) => format!("A book move in the {} ({}).", opening.name, opening.eco),
            None => "A book move.".to_string(),
        },
        Label::Good => format!("A solid move. {best} was slightly more precise."),
        Label::Inaccuracy => format!("An inaccuracy. {best} was better, you gave away {swing}."),
        Label::Mistake if record.material_delta <= -2 => format!(
            "A mistake that loses {} points of material. {best} was better.",
            -record.material_delta
        ),
        Label::Mistake => format!("A mistake. {best} was better, you gave away {swing}."),
        Label::Blunder if record.material_delta <= -HUNG_PIECE_MATERIAL => format!(
            "You hung a piece! This loses {} points of material; {best} was necessary.",
            -record.material_delta
        ),
        Label::Blunder if record.flags.mate_threat => {
            format!("A blunder that allows a forced mate. {best} was necessary.")
        }
        Label::Blunder => format!("A blunder. {best} was necessary, you gave away {swing}."),
        Label::Miss if record.flags.mate_missed => {
            format!("You missed a forced mate sequence! {best} was the way.")
        }
        Label::Miss => format!("You missed a winning continuation with {best}."),
    };

    if record.phase == Phase::Endgame && matches!(label, Label::Inaccuracy | Label::Mistake) {
        text.push_str(" Precision matters in the endgame.");
    }

    match record.flags.sacrifice {
        SacrificeCheck::Unsound if label != Label::Brilliant => {
            text.push_str(" The sacrifice does not hold up under deeper analysis.");
        }
        SacrificeCheck::Failed => {
            text.push_str(" The sacrifice could not be verified.");
        }
        _ => {}
    }

    if record.flags.check && !matches!(label, Label::Blunder | Label::Miss | Label::Mistake) {
        text.push_str(" It also gives check.");
    }

    text
}

fn percent(loss: f64) -> String {
    format!("{:.0}% winning chances", loss * 100.0)
}

#[cfg(test)]
mod tests {
    use chess_core::Side;

    use super::*;
    use crate::opening::OpeningInfo;
    use crate::record::MoveFlags;

    fn record(label: Label) -> MoveRecord {
        MoveRecord {
            ply: 20,
            move_number: 11,
            side: Side::White,
            played: "d2d3".to_string(),
            fen_before: String::new(),
            rank: Some(3),
            best_move: Some("h5e5".to_string()),
            win_before: 0.55,
            win_after: 0.30,
            loss: 0.25,
            accuracy: 33.7,
            material_delta: 0,
            flags: MoveFlags::default(),
            phase: Phase::Middlegame,
            book: false,
            opening: None,
            label: Some(label),
            explanation: String::new(),
            unanalyzed: None,
        }
    }

    #[test]
    fn test_hung_piece() {
        let mut r = record(Label::Blunder);
        r.material_delta = -9;
        let text = explain(&r);
        assert!(text.starts_with("You hung a piece!"), "{text}");
        assert!(text.contains("9 points"));
        assert!(text.contains("h5e5"));

        r.material_delta = 0;
        assert!(explain(&r).contains("25% winning chances"));
    }

    #[test]
    fn test_missed_mate_and_great() {
        let mut r = record(Label::Miss);
        r.flags.mate_missed = true;
        assert!(explain(&r).starts_with("You missed a forced mate sequence!"));

        assert_eq!(
            explain(&record(Label::Great)),
            "You found the only move that saves the position!"
        );
    }

    #[test]
    fn test_book_names_opening() {
        let mut r = record(Label::Book);
        r.opening = Some(OpeningInfo {
            eco: "C60".to_string(),
            name: "Ruy Lopez".to_string(),
        });
        assert_eq!(explain(&r), "A book move in the Ruy Lopez (C60).");
    }

    #[test]
    fn test_checkmate_and_unanalyzed() {
        let mut r = record(Label::Best);
        r.flags.mate_delivered = true;
        assert_eq!(explain(&r), "Checkmate! The game is over.");

        let mut r = record(Label::Best);
        r.label = None;
        r.unanalyzed = Some("empty candidate set".to_string());
        assert!(explain(&r).contains("empty candidate set"));
    }

    #[test]
    fn test_sacrifice_notes() {
        let mut r = record(Label::Good);
        r.flags.sacrifice = SacrificeCheck::Failed;
        assert!(explain(&r).ends_with("could not be verified."));

        r.flags.sacrifice = SacrificeCheck::Unsound;
        assert!(explain(&r).contains("does not hold up"));

        let mut r = record(Label::Brilliant);
        r.material_delta = -5;
        r.flags.sacrifice = SacrificeCheck::Sound;
        assert!(explain(&r).contains("gave up 5 points"));
    }

    #[test]
    fn test_deterministic() {
        let r = record(Label::Inaccuracy);
        assert_eq!(explain(&r), explain(&r));
    }
}
