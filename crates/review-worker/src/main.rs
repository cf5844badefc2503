//! Game review worker
//!
//! Reviews a single PGN game with a local Stockfish and prints the
//! per-move records and the game summary as JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chess_core::pgn::parse_pgn;
use tracing::info;

use review_worker::opening::OpeningBook;
use review_worker::stockfish::StockfishEngine;
use review_worker::{Reviewer, WorkerConfig};

struct Args {
    pgn_path: PathBuf,
    out: Option<PathBuf>,
}

/// Parse `<game.pgn> [--out file]` from CLI args
fn parse_args() -> anyhow::Result<Args> {
    let mut pgn_path = None;
    let mut out = None;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" | "-o" => {
                let path = args.next().context("--out needs a file path")?;
                out = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                bail!("usage: review-worker <game.pgn> [--out file]");
            }
            _ if pgn_path.is_none() => pgn_path = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument: {arg}"),
        }
    }

    let pgn_path = pgn_path.context("usage: review-worker <game.pgn> [--out file]")?;
    Ok(Args { pgn_path, out })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args = parse_args()?;
    let config = WorkerConfig::load()?;
    info!(
        stockfish_path = %config.stockfish_path,
        depth = config.review.search.depth,
        multipv = config.review.search.multipv,
        "Worker config loaded"
    );

    let pgn = fs::read_to_string(&args.pgn_path)
        .with_context(|| format!("reading {}", args.pgn_path.display()))?;
    let game = parse_pgn(&pgn)?;

    let book = OpeningBook::load_or_builtin(config.opening_book_path.as_deref());
    let engine = StockfishEngine::new(&config.stockfish_path).await?;

    let mut reviewer = Reviewer::new(engine, config.review.clone(), book);
    let review = reviewer.review_game(&game).await;
    reviewer.into_oracle().quit().await;
    let review = review?;

    let json = serde_json::to_string_pretty(&review)?;
    match args.out {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "Review written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
