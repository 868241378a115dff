//! SQLite-backed implementation of the core [`Store`] trait.
//!
//! Vectors are stored as little-endian f32 BLOBs in the `embeddings`
//! table. Similarity scans pull every embedding row joined with its
//! owning resource and compute cosine similarity in Rust; at the corpus
//! sizes this tool targets (hundreds of policy documents) a full scan
//! is well under a millisecond and needs no vector index.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use uuid::Uuid;

use policy_kb_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use policy_kb_core::models::{EmbeddingRow, NewResource, SimilarPassage};
use policy_kb_core::store::Store;

/// [`Store`] implementation over a SQLite connection pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_resource(&self, resource: &NewResource) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO resources (id, content, source_file, policy_number, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&resource.content)
        .bind(&resource.source_file)
        .bind(&resource.policy_number)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn insert_embeddings(&self, rows: &[EmbeddingRow]) -> Result<()> {
        // All rows of one document land atomically.
        let mut tx = self.pool.begin().await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO embeddings (id, resource_id, content, embedding)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&row.id)
            .bind(&row.resource_id)
            .bind(&row.content)
            .bind(vec_to_blob(&row.vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn scan_similar(&self, query_vec: &[f32]) -> Result<Vec<SimilarPassage>> {
        let rows = sqlx::query(
            r#"
            SELECT e.content, e.embedding, r.source_file, r.policy_number
            FROM embeddings e
            JOIN resources r ON r.id = e.resource_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let passages = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vector = blob_to_vec(&blob);
                SimilarPassage {
                    content: row.get("content"),
                    similarity: cosine_similarity(&vector, query_vec) as f64,
                    source_file: row.get("source_file"),
                    policy_number: row.get("policy_number"),
                }
            })
            .collect();

        Ok(passages)
    }

    async fn resource_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resources")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn embedding_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM embeddings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
