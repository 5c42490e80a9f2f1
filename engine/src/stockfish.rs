use crate::uci::{parse_uci_message, UciMessage};
use crate::{EngineError, EngineEvent, Evaluator, EvaluatorFactory, Score, TopMove, CANDIDATE_COUNT};
use chess::{format_uci_move, side_to_move, with_counters, AnalysisScore, Side};
use cozy_chess::Move;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc;

/// Configuration for engine processes.
#[derive(Debug, Clone)]
pub struct StockfishConfig {
    /// Explicit binary path; common install locations are probed when unset.
    pub path: Option<PathBuf>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    /// How long to wait for `uciok` / `readyok`.
    pub init_timeout: Duration,
}

impl Default for StockfishConfig {
    fn default() -> Self {
        Self {
            path: None,
            threads: Some(1),
            hash_mb: None,
            init_timeout: Duration::from_secs(10),
        }
    }
}

/// Spawns one Stockfish process per evaluator.
#[derive(Debug, Clone, Default)]
pub struct StockfishFactory {
    config: StockfishConfig,
}

impl StockfishFactory {
    pub fn new(config: StockfishConfig) -> Self {
        Self { config }
    }
}

impl EvaluatorFactory for StockfishFactory {
    type Evaluator = StockfishEvaluator;

    async fn spawn(&self, depth: u8) -> Result<StockfishEvaluator, EngineError> {
        StockfishEvaluator::spawn(&self.config, depth).await
    }
}

/// A Stockfish process searching every position to a fixed depth with
/// `MultiPV` set to the candidate count.
pub struct StockfishEvaluator {
    process: Child,
    stdin: ChildStdin,
    event_rx: mpsc::Receiver<EngineEvent>,
    depth: u8,
    position: Option<(String, Side)>,
}

impl StockfishEvaluator {
    #[tracing::instrument(level = "info", skip(config), fields(path = ?config.path))]
    pub async fn spawn(config: &StockfishConfig, depth: u8) -> Result<Self, EngineError> {
        let path = match &config.path {
            Some(path) => path.clone(),
            None => find_stockfish_path().ok_or(EngineError::NotFound)?,
        };
        tracing::debug!(?path, "Spawning Stockfish process");

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn Stockfish: {}", e);
                EngineError::Spawn(e.to_string())
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("engine has no stdin".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("engine has no stdout".to_string()))?;

        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(64);

        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::debug!("Stockfish stdout EOF");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!("UCI << {}", trimmed);

                        let event = match parse_uci_message(trimmed) {
                            Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => EngineEvent::Ready,
                            Ok(UciMessage::BestMove { mv, .. }) => EngineEvent::BestMove(mv),
                            Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
                            _ => continue,
                        };

                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from Stockfish stdout: {}", e);
                        break;
                    }
                }
            }
        });

        let mut evaluator = Self {
            process,
            stdin,
            event_rx,
            depth,
            position: None,
        };

        evaluator.send("uci").await?;
        evaluator.wait_ready(config.init_timeout, "uciok").await?;

        if let Some(threads) = config.threads {
            let threads = threads.clamp(1, 16);
            evaluator
                .send(&format!("setoption name Threads value {}", threads))
                .await?;
        }
        if let Some(hash_mb) = config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 2048);
            evaluator
                .send(&format!("setoption name Hash value {}", hash_mb))
                .await?;
        }
        evaluator
            .send(&format!("setoption name MultiPV value {}", CANDIDATE_COUNT))
            .await?;

        evaluator.send("isready").await?;
        evaluator.wait_ready(config.init_timeout, "readyok").await?;

        tracing::info!(depth, "Stockfish evaluator ready");
        Ok(evaluator)
    }

    async fn send(&mut self, command: &str) -> Result<(), EngineError> {
        tracing::trace!("UCI >> {}", command);
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn wait_ready(&mut self, timeout: Duration, what: &'static str) -> Result<(), EngineError> {
        let wait = tokio::time::timeout(timeout, async {
            while let Some(event) = self.event_rx.recv().await {
                if matches!(event, EngineEvent::Ready) {
                    return Ok(());
                }
            }
            Err(EngineError::Closed)
        })
        .await;

        match wait {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Timeout waiting for {}", what);
                Err(EngineError::Timeout(what))
            }
        }
    }

    async fn search(&mut self, count: usize) -> Result<Vec<TopMove>, EngineError> {
        let (fen, side) = self.position.clone().ok_or(EngineError::NoPosition)?;

        self.send(&format!("position fen {}", fen)).await?;
        self.send(&format!("go depth {}", self.depth)).await?;

        // Latest line per multipv index; deeper iterations overwrite shallower ones.
        let mut lines: BTreeMap<u8, (Score, Move)> = BTreeMap::new();
        loop {
            match self.event_rx.recv().await {
                Some(EngineEvent::Info(info)) => {
                    if let (Some(score), Some(&first)) = (info.score, info.pv.first()) {
                        lines.insert(info.multipv.unwrap_or(1), (score, first));
                    }
                }
                Some(EngineEvent::BestMove(None)) => return Ok(Vec::new()),
                Some(EngineEvent::BestMove(Some(_))) => break,
                Some(EngineEvent::Ready) => {}
                None => return Err(EngineError::Closed),
            }
        }

        Ok(lines
            .into_values()
            .take(count)
            .map(|(score, mv)| {
                let white_relative = AnalysisScore::from(score).from_side_to_move(side);
                TopMove::new(format_uci_move(mv), white_relative)
            })
            .collect())
    }
}

impl Evaluator for StockfishEvaluator {
    fn set_position(&mut self, fen: &str) -> Result<(), EngineError> {
        let side = side_to_move(fen)?;
        chess::parse_fen(fen)?;
        self.position = Some((with_counters(fen), side));
        Ok(())
    }

    async fn top_moves(&mut self, count: usize) -> Result<Vec<TopMove>, EngineError> {
        self.search(count).await
    }

    async fn shutdown(mut self) {
        let _ = self.send("quit").await;
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
    }
}

/// Find Stockfish executable in common locations
pub fn find_stockfish_path() -> Option<PathBuf> {
    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // In PATH
    ];

    for path_str in paths {
        let path = Path::new(path_str);
        if path.exists() || path_str == "stockfish" {
            // Stockfish exits on EOF, so probing with an empty stdin is safe.
            let probe = std::process::Command::new(path_str)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            if probe.is_ok() {
                return Some(PathBuf::from(path_str));
            }
        }
    }

    None
}
