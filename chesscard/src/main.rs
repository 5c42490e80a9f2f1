//! chesscard command-line entry point.
//!
//! Subcommands map one-to-one onto the [`ChessCard`] facade: `ingest` reads
//! PGN archives into the store, `evaluate-game` / `evaluate-next` run engine
//! batches, and `report` prints a game's analytics views as JSON.

use std::path::PathBuf;

use anyhow::Context;
use chesscard::persistence::Database;
use chesscard::{config, ChessCard};
use clap::{Args, Parser, Subcommand};
use engine::{StockfishConfig, StockfishFactory};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "chesscard", about = "Chess game ingest, engine evaluation and move-quality reports")]
struct Cli {
    /// SQLite database path. Defaults to `CHESSCARD_DB_PATH` or the data directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one or more PGN archives.
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Record a fetch of this user's archive.
        #[arg(long)]
        user: Option<String>,
        /// The user's account-open time, in unix seconds.
        #[arg(long, requires = "user")]
        account_open: Option<u64>,
    },
    /// Evaluate every position of one game below the target depth.
    EvaluateGame {
        game_id: String,
        #[command(flatten)]
        eval: EvalArgs,
    },
    /// Evaluate the next N under-evaluated positions.
    EvaluateNext {
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,
        /// Evaluate this game's positions first.
        #[arg(long)]
        prefer_game: Option<String>,
        #[command(flatten)]
        eval: EvalArgs,
    },
    /// Print a game's analytics as JSON.
    Report { game_id: String },
}

#[derive(Args, Default)]
struct EvalArgs {
    /// Search depth (1-19).
    #[arg(long)]
    depth: Option<u8>,
    /// Number of engine processes.
    #[arg(long)]
    workers: Option<usize>,
    /// Wall-clock budget for the batch.
    #[arg(long)]
    budget_secs: Option<u64>,
}

/// Log to stderr, or to a daily rolling file when `CHESSCARD_LOG_DIR` is set.
/// The returned guard must be held until exit to flush file output.
fn init_tracing() -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match config::get_log_dir() {
        Some(log_dir) => {
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("creating log directory {}", log_dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(&log_dir, "chesscard");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_tracing()?;
    let cli = Cli::parse();

    let db_path = cli.db.unwrap_or_else(config::get_db_path);
    tracing::info!(path = %db_path.display(), "Using database");
    let db = Database::open(&db_path)
        .await
        .with_context(|| format!("opening database {}", db_path.display()))?;

    let no_overrides = EvalArgs::default();
    let eval = match &cli.command {
        Commands::EvaluateGame { eval, .. } | Commands::EvaluateNext { eval, .. } => eval,
        _ => &no_overrides,
    };
    let scheduler_config = config::scheduler_config(eval.depth, eval.workers, eval.budget_secs)?;
    let factory = StockfishFactory::new(StockfishConfig {
        path: config::get_stockfish_path(),
        ..Default::default()
    });
    let card = ChessCard::new(db, factory, scheduler_config);

    match cli.command {
        Commands::Ingest {
            files,
            user,
            account_open,
        } => {
            let mut total = chesscard::persistence::IngestReport::default();
            for file in &files {
                let text = std::fs::read_to_string(file)
                    .with_context(|| format!("reading {}", file.display()))?;
                let report = card
                    .ingest_pgn(&text, user.as_deref())
                    .await
                    .with_context(|| format!("ingesting {}", file.display()))?;
                for skipped in &report.skipped {
                    eprintln!(
                        "skipped game {} in {}: {}",
                        skipped.game_id.as_deref().unwrap_or("?"),
                        file.display(),
                        skipped.reason
                    );
                }
                total.merge(report);
            }
            if let (Some(username), Some(opened_at)) = (user.as_deref(), account_open) {
                card.record_account_open(username, opened_at)
                    .await
                    .with_context(|| format!("recording account open for {username}"))?;
            }
            println!(
                "games: {} new, {} existing; positions: {} new; plies: {} new; skipped: {}",
                total.games_inserted,
                total.games_existing,
                total.positions_inserted,
                total.plies_inserted,
                total.skipped.len()
            );
        }
        Commands::EvaluateGame { game_id, .. } => {
            let report = card
                .evaluate_game(&game_id)
                .await
                .with_context(|| format!("evaluating game {game_id}"))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::EvaluateNext {
            count, prefer_game, ..
        } => {
            let report = card
                .evaluate_next_n(count, prefer_game.as_deref())
                .await
                .context("evaluating positions")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Report { game_id } => {
            let report = card
                .report(&game_id)
                .await
                .with_context(|| format!("building report for game {game_id}"))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
