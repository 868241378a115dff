//! # Policy KB CLI (`pkb`)
//!
//! The `pkb` binary is the primary interface for Policy KB. It provides
//! commands for database initialization, document ingestion, retrieval
//! queries, and index statistics.
//!
//! ## Usage
//!
//! ```bash
//! pkb --config ./pkb.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pkb init` | Create the SQLite database and run schema migrations |
//! | `pkb add <file>` | Ingest one file (`.pdf`, `.md`, or `.txt`) |
//! | `pkb note "<text>"` | Ingest raw text from the command line |
//! | `pkb ingest <dir>` | Batch-ingest every PDF in a directory |
//! | `pkb query "<question>"` | Retrieve the most similar stored passages |
//! | `pkb stats` | Show resource and embedding counts |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! pkb init --config ./pkb.toml
//!
//! # Ingest a single policy document
//! pkb add "P-018-001 Information Security Policy.pdf"
//!
//! # Batch-ingest a directory of policies
//! pkb ingest ./policies
//!
//! # Ask a question
//! pkb query "What is the data retention period for audit logs?"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use policy_kb::{config, ingest, migrate, query, stats};

/// Policy KB CLI — a local-first knowledge base for compliance policy
/// documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/pkb.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pkb",
    about = "Policy KB — a local-first knowledge base and retrieval CLI for compliance policy documents",
    version,
    long_about = "Policy KB ingests compliance policy documents (PDF, markdown, plain text), \
    chunks them on markdown header boundaries, embeds the chunks, and answers questions by \
    cosine-similarity retrieval over the stored vectors."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./pkb.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the resources and embeddings
    /// tables. This command is idempotent; running it multiple times is
    /// safe.
    Init,

    /// Ingest a single file.
    ///
    /// PDFs are converted to markdown by the configured parsing service;
    /// `.md` and `.txt` files are read directly. A policy number is
    /// extracted from the file name when it starts with `P-` or `PM-`.
    Add {
        /// Path to the file (`.pdf`, `.md`, or `.txt`).
        file: PathBuf,
    },

    /// Ingest raw text from the command line.
    ///
    /// The text is chunked and embedded like a file, but carries no file
    /// provenance.
    Note {
        /// The text to ingest.
        content: String,
    },

    /// Batch-ingest every PDF in a directory.
    ///
    /// Files are processed in name order; a failure on one file is
    /// reported and the rest continue.
    Ingest {
        /// Directory containing PDF files.
        dir: PathBuf,
    },

    /// Retrieve the stored passages most similar to a question.
    ///
    /// Prints ranked passages with similarity scores and provenance.
    Query {
        /// The question to ask.
        question: String,

        /// Maximum number of passages to return (overrides config).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show resource and embedding counts.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Add { file } => {
            ingest::run_add(&cfg, &file).await?;
        }
        Commands::Note { content } => {
            ingest::run_note(&cfg, &content).await?;
        }
        Commands::Ingest { dir } => {
            ingest::run_batch(&cfg, &dir).await?;
        }
        Commands::Query { question, limit } => {
            query::run_query(&cfg, &question, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
