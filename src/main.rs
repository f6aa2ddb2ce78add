//! # askmydocs CLI (`ask`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ask init` | Create the SQLite index database |
//! | `ask index <pdf>` | Extract, chunk, and index a PDF |
//! | `ask query <doc> "<question>"` | Answer a question with cited sources |
//! | `ask show <doc>` | Print a stored index's summary |
//! | `ask serve` | Start the HTTP server |
//!
//! All commands accept a `--config` flag pointing to a TOML configuration
//! file. See `config/askmydocs.example.toml` for a full example.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use askmydocs::pipeline::Pipeline;
use askmydocs::{config, migrate, server};

/// askmydocs — ask questions about a PDF and get answers with cited
/// source pages.
#[derive(Parser)]
#[command(
    name = "ask",
    about = "Ask questions about a PDF and get answers with cited source pages",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/askmydocs.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the index database.
    ///
    /// Creates the SQLite database file and schema. Idempotent.
    Init,

    /// Extract, chunk, and index a PDF.
    ///
    /// Builds the index under the configured scoring strategy and
    /// persists it; re-indexing the same document replaces its index
    /// atomically.
    Index {
        /// Path to the PDF.
        path: PathBuf,
    },

    /// Ask a question against an indexed document.
    ///
    /// Retrieves the most relevant chunks, asks the generative model,
    /// and prints the answer with its cited sources.
    Query {
        /// Document path or index key.
        document: String,
        /// The question to answer.
        question: String,
        /// Override the number of chunks retrieved.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Print a stored index's summary.
    Show {
        /// Document path or index key.
        document: String,
    },

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and exposes `POST /documents`,
    /// `POST /query`, and `GET /health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index { path } => {
            let pipeline = Pipeline::from_config(cfg).await?;
            let processed = pipeline.process_document(&path).await?;
            println!("indexed {}", path.display());
            println!("  chunks: {}", processed.chunk_count);
            println!("  key: {}", processed.index_key);
        }
        Commands::Query {
            document,
            question,
            top_k,
        } => {
            if let Some(k) = top_k {
                cfg.retrieval.top_k = k.max(1);
            }
            let pipeline = Pipeline::from_config(cfg).await?;
            let key = pipeline.resolve_index_key(&document).await?;
            let answer = pipeline.answer_query(&key, &question).await?;

            println!("{}", answer.answer.trim());
            println!();
            println!("Sources:");
            for (i, source) in answer.sources.iter().enumerate() {
                let page = source
                    .page
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                println!("  [Source {}] page {}", i + 1, page);
                println!("    \"{}\"", source.excerpt.replace('\n', " ").trim());
            }
        }
        Commands::Show { document } => {
            let pipeline = Pipeline::from_config(cfg).await?;
            let key = pipeline.resolve_index_key(&document).await?;
            let index = pipeline.load_index(&key).await?;

            println!("index {}", key);
            println!("  strategy: {}", index.strategy);
            println!("  chunks: {}", index.chunks.len());
            println!("  content hash: {}", index.content_hash);
            for chunk in &index.chunks {
                let page = chunk
                    .page
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                let snippet: String = chunk.text.chars().take(60).collect();
                println!(
                    "  [{}] page {}: \"{}\"",
                    chunk.chunk_index,
                    page,
                    snippet.replace('\n', " ")
                );
            }
        }
        Commands::Serve => {
            let pipeline = Pipeline::from_config(cfg).await?;
            server::run_server(Arc::new(pipeline)).await?;
        }
    }

    Ok(())
}
