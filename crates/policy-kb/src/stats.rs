//! `pkb stats` command implementation.
//!
//! Prints a quick summary of what's indexed: resource and embedding
//! counts, database size, and a per-policy breakdown.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_resources: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resources")
        .fetch_one(&pool)
        .await?;

    let total_embeddings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM embeddings")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Policy KB — Database Stats");
    println!("==========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Resources:   {}", total_resources);
    println!("  Embeddings:  {}", total_embeddings);

    // Per-policy breakdown
    let policy_rows = sqlx::query(
        r#"
        SELECT
            COALESCE(r.policy_number, '(none)') AS policy,
            COUNT(DISTINCT r.id) AS resource_count,
            COUNT(e.id) AS embedding_count
        FROM resources r
        LEFT JOIN embeddings e ON e.resource_id = r.id
        GROUP BY policy
        ORDER BY resource_count DESC, policy ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if !policy_rows.is_empty() {
        println!();
        println!("  By policy:");
        println!("  {:<16} {:>10} {:>12}", "POLICY", "RESOURCES", "EMBEDDINGS");
        println!("  {}", "-".repeat(40));

        for row in &policy_rows {
            let policy: String = row.get("policy");
            let resource_count: i64 = row.get("resource_count");
            let embedding_count: i64 = row.get("embedding_count");
            println!(
                "  {:<16} {:>10} {:>12}",
                policy, resource_count, embedding_count
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_format_scales() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
