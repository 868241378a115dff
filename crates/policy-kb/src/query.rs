//! `pkb query` command implementation.

use anyhow::Result;

use policy_kb_core::retrieve::{retrieve, RetrievalParams};

use crate::config::Config;
use crate::db;
use crate::embedding::create_embedder;
use crate::sqlite_store::SqliteStore;

/// Run a retrieval query and print the ranked passages.
pub async fn run_query(config: &Config, question: &str, limit: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let embedder = create_embedder(&config.embedding)?;

    // --limit is clamped to 1 like the retrieval.max_results validation.
    let params = RetrievalParams {
        similarity_threshold: config.retrieval.similarity_threshold,
        max_results: limit.unwrap_or(config.retrieval.max_results).max(1),
    };

    let passages = retrieve(&store, embedder.as_ref(), question, &params).await?;

    if passages.is_empty() {
        println!("No matching passages found.");
        return Ok(());
    }

    for (i, passage) in passages.iter().enumerate() {
        let provenance = match (&passage.policy_number, &passage.source_file) {
            (Some(policy), Some(file)) => format!("{} / {}", policy, file),
            (Some(policy), None) => policy.clone(),
            (None, Some(file)) => file.clone(),
            (None, None) => "(note)".to_string(),
        };

        println!("{}. [{:.2}] {}", i + 1, passage.similarity, provenance);
        println!("    excerpt: \"{}\"", excerpt(&passage.content, 200));
        println!();
    }

    Ok(())
}

/// First `max` characters of a passage, newlines flattened, on a char
/// boundary so multi-byte text never splits mid-character.
fn excerpt(content: &str, max: usize) -> String {
    let flat = content.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() <= max {
        return flat.to_string();
    }
    let cut: String = flat.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}
