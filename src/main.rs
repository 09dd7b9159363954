use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::OnceCell;
use tracing::error;
use tracing_subscriber::EnvFilter;

use qbank::bootstrap::{StartupStep, run_steps};
use qbank::config::Config;
use qbank::db::Db;
use qbank::vector::VectorStore;
use qbank::vector::chroma::ChromaStore;
use qbank::{ingest, server};

#[derive(Parser)]
#[command(name = "qbank", version, about = "Interview question bank backend")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server (default).
    Serve,
    /// Synchronize the question bank into the vector store, then exit.
    Sync,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(&cli.config)?;
    config.apply_env_overrides();
    config.validate()?;
    let config = Arc::new(config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Sync => sync_once(&config).await,
    }
}

/// Full startup sequence, then serve.
///
/// Only the database step is fatal; the vector-store steps degrade search
/// rather than stop the server. Listening happens strictly after the steps,
/// so a fatal failure means the port is never bound and the process exits
/// with status 1.
async fn serve(config: Arc<Config>) -> Result<()> {
    let store: Arc<dyn VectorStore> = Arc::new(ChromaStore::new(&config.vector)?);
    let db_cell: Arc<OnceCell<Db>> = Arc::new(OnceCell::new());

    let mut steps = vec![StartupStep::fatal("mongodb", {
        let config = config.clone();
        let db_cell = db_cell.clone();
        async move {
            let db = Db::connect(&config.mongo)
                .await
                .context("MongoDB connection failed")?;
            db.ensure_indexes().await?;
            let hosts = db.hosts().join(", ");
            let _ = db_cell.set(db);
            Ok(format!("connected ({hosts})"))
        }
    })];

    if config.vector.enabled {
        steps.push(StartupStep::best_effort("vector-store", {
            let store = store.clone();
            async move {
                store.heartbeat().await?;
                store.initialize().await?;
                Ok("initialized".to_string())
            }
        }));
        steps.push(StartupStep::best_effort("vector-sync", {
            let store = store.clone();
            let db_cell = db_cell.clone();
            async move {
                let db = db_cell
                    .get()
                    .context("database handle missing for vector sync")?;
                let count = ingest::sync_questions(db, store.as_ref()).await?;
                Ok(format!("synchronized {count} questions"))
            }
        }));
    }

    run_steps(steps).await?;

    let db = db_cell
        .get()
        .cloned()
        .context("database handle missing after startup")?;

    server::run(config, db, store).await
}

/// Manual synchronization, for operators and cron. Unlike the startup step,
/// failure here is fatal: running sync by hand means you want to know.
async fn sync_once(config: &Config) -> Result<()> {
    let store = ChromaStore::new(&config.vector)?;
    let db = Db::connect(&config.mongo)
        .await
        .context("MongoDB connection failed")?;

    store
        .initialize()
        .await
        .context("vector store initialization failed")?;
    let count = ingest::sync_questions(&db, &store).await?;
    println!("Synchronized {count} questions");
    Ok(())
}
