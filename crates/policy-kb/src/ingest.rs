//! `pkb add`, `pkb note`, and `pkb ingest` command implementations.
//!
//! `add` ingests a single file (PDF via the remote parser, markdown and
//! plain text read directly), `note` ingests raw text from the command
//! line, and `ingest` batch-processes every PDF in a directory.

use std::path::Path;

use anyhow::{bail, Result};

use policy_kb_core::ingest::{ingest, IngestError};
use policy_kb_core::policy::extract_policy_number;

use crate::config::Config;
use crate::db;
use crate::embedding::create_embedder;
use crate::parser::ParserClient;
use crate::sqlite_store::SqliteStore;

/// Ingest one file.
pub async fn run_add(config: &Config, file: &Path) -> Result<()> {
    let content = extract_text(config, file).await?;

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let policy_number = extract_policy_number(&file_name);

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let embedder = create_embedder(&config.embedding)?;

    let summary = ingest(
        &store,
        embedder.as_ref(),
        &content,
        Some(&file_name),
        policy_number.as_deref(),
    )
    .await?;

    if let Some(policy) = &policy_number {
        println!("add {} [{}]", file_name, policy);
    } else {
        println!("add {}", file_name);
    }
    println!(
        "Resource successfully created and embedded. ({} chunks created)",
        summary.chunks_embedded
    );
    Ok(())
}

/// Ingest raw text with no file provenance.
pub async fn run_note(config: &Config, content: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let embedder = create_embedder(&config.embedding)?;

    let summary = ingest(&store, embedder.as_ref(), content, None, None).await?;

    println!(
        "Resource successfully created and embedded. ({} chunks created)",
        summary.chunks_embedded
    );
    Ok(())
}

/// Ingest every PDF in a directory, continuing past per-file failures.
pub async fn run_batch(config: &Config, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        println!("No PDF files found in {}", dir.display());
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let embedder = create_embedder(&config.embedding)?;
    let parser = ParserClient::new(&config.parser)?;

    println!("ingest {}", dir.display());
    println!("  files found: {}", paths.len());

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut total_chunks = 0usize;

    for path in &paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let result = async {
            let content = parser.parse_pdf(path).await?;
            let policy_number = extract_policy_number(&file_name);
            let summary = ingest(
                &store,
                embedder.as_ref(),
                &content,
                Some(&file_name),
                policy_number.as_deref(),
            )
            .await?;
            Ok::<_, anyhow::Error>(summary)
        }
        .await;

        match result {
            Ok(summary) => {
                println!("  {} ({} chunks)", file_name, summary.chunks_embedded);
                succeeded += 1;
                total_chunks += summary.chunks_embedded;
            }
            Err(e) => {
                eprintln!("  {} failed: {}", file_name, e);
                failed += 1;
            }
        }
    }

    println!("  ingested: {} files", succeeded);
    println!("  failed: {} files", failed);
    println!("  chunks written: {}", total_chunks);
    println!("ok");
    Ok(())
}

/// Pull markdown text out of a file, dispatching on extension.
async fn extract_text(config: &Config, file: &Path) -> Result<String> {
    let ext = file
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => {
            let parser = ParserClient::new(&config.parser)?;
            Ok(parser.parse_pdf(file).await?)
        }
        "md" | "txt" => {
            let content = std::fs::read_to_string(file)?;
            if content.trim().is_empty() {
                return Err(IngestError::Validation(format!(
                    "{} is empty",
                    file.display()
                ))
                .into());
            }
            Ok(content)
        }
        other => bail!("Unsupported file type: .{} (expected .pdf, .md, or .txt)", other),
    }
}
