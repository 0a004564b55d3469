//! Command-line interface for Eidetic.
//!
//! `find` scans file contents directly and needs no API key. `build`,
//! `rank`, and `clean` work with the embedding store and require
//! `OPENAI_API_KEY`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use eidetic_catalog::{Catalog, DirectoryCatalog};
use eidetic_index::{IndexConfig, OpenAiEmbedder, ScanIndex, SearchEngine};

#[derive(Parser)]
#[command(name = "eidetic", version, about = "Search plain-text notes lexically and by meaning")]
struct Cli {
    /// Data directory (defaults to EIDETIC_DATA_DIR or ~/.eidetic).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the tracked note directories.
    Dirs {
        #[command(subcommand)]
        command: DirsCommand,
    },
    /// Embed every catalog file and persist the records.
    Build,
    /// Case-insensitive substring search with context snippets.
    Find {
        /// Text to look for.
        query: String,
    },
    /// Rank all indexed files by similarity to the query.
    Rank {
        /// Free-text query.
        query: String,
    },
    /// Remove stale and superseded embedding records.
    Clean,
}

#[derive(Subcommand)]
enum DirsCommand {
    /// Track a directory of notes.
    Add { path: PathBuf },
    /// List the tracked directories.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut builder = IndexConfig::builder();
    if let Some(dir) = cli.data_dir {
        builder = builder.data_dir(dir);
    }
    let config = builder.build()?;

    let catalog = Arc::new(DirectoryCatalog::open(&config.data_dir).await?);

    match cli.command {
        Command::Dirs { command } => match command {
            DirsCommand::Add { path } => {
                if catalog.add_directory(&path).await? {
                    println!("tracking {}", path.display());
                } else {
                    println!("already tracking {}", path.display());
                }
            }
            DirsCommand::List => {
                for dir in catalog.directories().await {
                    println!("{}", dir.display());
                }
            }
        },
        Command::Find { query } => {
            let corpus = catalog.all_files().await?;
            let hits = ScanIndex::new(catalog.clone(), corpus).lookup(&query).await?;
            if hits.is_empty() {
                println!("no matches");
            }
            for hit in hits {
                println!("{}: {}", hit.filepath.display(), hit.context);
            }
        }
        Command::Build => {
            let engine = build_engine(catalog, config)?;
            engine.refresh_corpus().await?;
            let outcome = engine.build_all().await?;
            println!("stored {} embedding record(s)", outcome.stored.len());
            for failure in &outcome.failures {
                eprintln!("failed: {}: {}", failure.source_path.display(), failure.error);
            }
            if !outcome.is_complete() {
                anyhow::bail!("{} file(s) failed to build", outcome.failures.len());
            }
        }
        Command::Rank { query } => {
            let engine = build_engine(catalog, config)?;
            engine.load().await?;
            for (i, entry) in engine.rank(&query).await?.iter().enumerate() {
                println!("{:>3}. {}", i + 1, entry.filepath.display());
            }
        }
        Command::Clean => {
            let engine = build_engine(catalog, config)?;
            let removed = engine.clean().await?;
            println!("removed {removed} record(s)");
        }
    }

    Ok(())
}

/// Engine wired to the OpenAI embeddings service; only the commands
/// that touch the embedding store construct one.
fn build_engine(
    catalog: Arc<DirectoryCatalog>,
    config: IndexConfig,
) -> anyhow::Result<SearchEngine> {
    let embedder = OpenAiEmbedder::from_env()
        .context("OPENAI_API_KEY is required for this command")?
        .with_model(config.model.clone())
        .with_max_retries(config.max_retries)
        .with_request_timeout(config.request_timeout)?;
    let engine = SearchEngine::builder()
        .config(config)
        .catalog(catalog)
        .embedder(Arc::new(embedder))
        .build()?;
    Ok(engine)
}
