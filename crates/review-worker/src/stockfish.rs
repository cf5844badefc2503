//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::process::Stdio;

use chess_core::Position;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use crate::error::OracleError;
use crate::eval::Score;
use crate::oracle::{CandidateMove, CandidateSet, Oracle};

/// One `info ... pv ...` line
#[derive(Debug, Clone, PartialEq)]
struct InfoLine {
    multipv: u32,
    score: Score,
    pv: Vec<String>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    multipv: u32,
    /// A `go` was sent and its `bestmove` not read yet
    searching: bool,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str) -> Result<Self, OracleError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OracleError::Spawn(format!("{path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| OracleError::Spawn("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| OracleError::Spawn("engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
            multipv: 1,
            searching: false,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine.send("setoption name Threads value 1").await?;
        engine.send("setoption name Hash value 256").await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        info!(path, "Stockfish ready");
        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), OracleError> {
        debug!(cmd, "SF <");
        self.stdin.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, OracleError> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line).await?;
        if read == 0 {
            return Err(OracleError::Protocol("engine closed its output".into()));
        }
        Ok(line.trim().to_string())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), OracleError> {
        loop {
            let line = self.read_line().await?;
            debug!(line = %line, "SF >");
            if line == expected {
                return Ok(());
            }
        }
    }

    /// Finish a search abandoned by a cancelled caller
    async fn settle(&mut self) -> Result<(), OracleError> {
        if !self.searching {
            return Ok(());
        }
        self.send("stop").await?;
        loop {
            if self.read_line().await?.starts_with("bestmove") {
                break;
            }
        }
        self.searching = false;
        Ok(())
    }

    async fn set_multipv(&mut self, multipv: u32) -> Result<(), OracleError> {
        if self.multipv != multipv {
            self.send(&format!("setoption name MultiPV value {multipv}")).await?;
            self.multipv = multipv;
        }
        Ok(())
    }

    /// Run one search and collect the final line per MultiPV slot.
    async fn search(&mut self, fen: &str, go: &str) -> Result<Vec<InfoLine>, OracleError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(go).await?;
        self.searching = true;

        let mut lines: Vec<Option<InfoLine>> = vec![None; self.multipv as usize];
        loop {
            let line = self.read_line().await?;
            if line.starts_with("bestmove") {
                self.searching = false;
                break;
            }
            if let Some(info) = parse_info(&line) {
                let slot = info.multipv.saturating_sub(1) as usize;
                if let Some(entry) = lines.get_mut(slot) {
                    *entry = Some(info);
                }
            }
        }

        // Keep the contiguous prefix of reported slots
        Ok(lines.into_iter().map_while(|l| l).collect())
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Oracle for StockfishEngine {
    async fn evaluate(
        &mut self,
        position: &Position,
        multipv: u32,
        depth: u32,
    ) -> Result<CandidateSet, OracleError> {
        self.settle().await?;
        self.set_multipv(multipv.max(1)).await?;
        let lines = self.search(position.fen(), &format!("go depth {depth}")).await?;
        if lines.is_empty() {
            return Err(OracleError::NoResult);
        }

        lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| to_candidate(line, i as u32 + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(CandidateSet::new)
    }

    async fn evaluate_move(
        &mut self,
        position: &Position,
        uci: &str,
        depth: u32,
    ) -> Result<CandidateMove, OracleError> {
        self.settle().await?;
        self.set_multipv(1).await?;
        let go = format!("go depth {depth} searchmoves {uci}");
        let line = self
            .search(position.fen(), &go)
            .await?
            .into_iter()
            .next()
            .ok_or(OracleError::NoResult)?;
        to_candidate(line, 1)
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

fn to_candidate(line: InfoLine, rank: u32) -> Result<CandidateMove, OracleError> {
    let uci = line
        .pv
        .first()
        .cloned()
        .ok_or_else(|| OracleError::Protocol("info line without pv".into()))?;
    Ok(CandidateMove {
        uci,
        rank,
        score: line.score,
        pv: line.pv,
    })
}

/// Parse a scored `info` line carrying a PV. Bound-only scores are skipped.
fn parse_info(line: &str) -> Option<InfoLine> {
    if !line.starts_with("info") || !line.contains(" pv ") {
        return None;
    }
    if line.contains("lowerbound") || line.contains("upperbound") {
        return None;
    }
    let score = Score::from_raw(parse_cp(line), parse_mate(line)).ok()?;
    Some(InfoLine {
        multipv: parse_multipv_index(line).unwrap_or(1),
        score,
        pv: parse_pv(line),
    })
}

fn token_after<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let mut parts = line.split_whitespace();
    while let Some(part) = parts.next() {
        if part == key {
            return parts.next()?.parse().ok();
        }
    }
    None
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    token_after(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    token_after(line, "mate")
}

/// Parse multipv index from info line
fn parse_multipv_index(line: &str) -> Option<u32> {
    token_after(line, "multipv")
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    line.split_whitespace()
        .skip_while(|part| *part != "pv")
        .skip(1)
        .take_while(|part| !part.starts_with("bmc") && *part != "string")
        .map(str::to_string)
        .collect()
}
