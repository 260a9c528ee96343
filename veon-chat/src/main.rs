use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use veon_chat::error::Result;
use veon_chat::{TurnProcessor, telemetry};
use veon_core::clock::SystemClock;
use veon_core::config::VeonConfig;
use veon_core::engine::MemoryEngine;
use veon_core::store::{InMemoryStore, MemoryStore, SqliteStore};
use veon_signal::KeywordClassifier;

/// VEON - conversational memory that fades like the real thing
#[derive(Parser)]
#[command(name = "veon-chat")]
#[command(about = "Reads one utterance per line and prints each turn's outcome as JSON")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// SQLite database path (overrides `persistence.path`)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Keep memories in memory only
    #[arg(long, conflicts_with = "db")]
    in_memory: bool,

    /// Print memory stats and counters on exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => VeonConfig::from_file(path)?,
        None => VeonConfig::default(),
    };
    telemetry::init_tracing(&config.general)?;

    if cli.in_memory {
        tracing::info!("Using in-memory store");
        let engine = MemoryEngine::new(InMemoryStore::new(), SystemClock, config.memory)?;
        chat_loop(TurnProcessor::new(engine, KeywordClassifier::new()), cli.stats).await
    } else {
        if let Some(db) = cli.db {
            config.persistence.path = db;
        }
        let store = SqliteStore::open_configured(&config.persistence)?;
        tracing::info!(path = %store.db_path().display(), "Opened memory store");
        let engine = MemoryEngine::new(store, SystemClock, config.memory)?;
        chat_loop(TurnProcessor::new(engine, KeywordClassifier::new()), cli.stats).await
    }
}

async fn chat_loop<S: MemoryStore + 'static>(
    processor: TurnProcessor<S, SystemClock, KeywordClassifier>,
    print_stats: bool,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match processor.handle_turn(line).await {
            Ok(outcome) => {
                let json = outcome.to_json()?;
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{json}")?;
                stdout.flush()?;
            }
            Err(e) => tracing::warn!(error = %e, "Turn rejected"),
        }
    }

    if print_stats {
        let engine = processor.engine();
        let stats = engine.stats()?;
        eprintln!(
            "memories: {} total, {} live, {} prunable, mean strength {:.3}",
            stats.total, stats.live, stats.prunable, stats.mean_strength
        );
        eprint!("{}", engine.counters().snapshot().to_prometheus());
    }
    Ok(())
}
