//! In-memory [`Store`] implementation for testing.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! The similarity scan is brute-force cosine similarity over all stored
//! vectors, matching the access pattern of the SQLite store.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::embedding::cosine_similarity;
use crate::models::{EmbeddingRow, NewResource, Resource, SimilarPassage};

use super::Store;

/// In-memory store for tests and examples.
#[derive(Default)]
pub struct MemoryStore {
    resources: RwLock<HashMap<String, Resource>>,
    embeddings: RwLock<Vec<EmbeddingRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_resource(&self, resource: &NewResource) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let mut resources = self.resources.write().unwrap();
        resources.insert(
            id.clone(),
            Resource {
                id: id.clone(),
                content: resource.content.clone(),
                source_file: resource.source_file.clone(),
                policy_number: resource.policy_number.clone(),
                created_at: chrono::Utc::now().timestamp(),
            },
        );
        Ok(id)
    }

    async fn insert_embeddings(&self, rows: &[EmbeddingRow]) -> Result<()> {
        let mut embeddings = self.embeddings.write().unwrap();
        embeddings.extend(rows.iter().cloned());
        Ok(())
    }

    async fn scan_similar(&self, query_vec: &[f32]) -> Result<Vec<SimilarPassage>> {
        let resources = self.resources.read().unwrap();
        let embeddings = self.embeddings.read().unwrap();

        let passages = embeddings
            .iter()
            .map(|row| {
                let owner = resources.get(&row.resource_id);
                SimilarPassage {
                    content: row.content.clone(),
                    similarity: cosine_similarity(&row.vector, query_vec) as f64,
                    source_file: owner.and_then(|r| r.source_file.clone()),
                    policy_number: owner.and_then(|r| r.policy_number.clone()),
                }
            })
            .collect();

        Ok(passages)
    }

    async fn resource_count(&self) -> Result<i64> {
        Ok(self.resources.read().unwrap().len() as i64)
    }

    async fn embedding_count(&self) -> Result<i64> {
        Ok(self.embeddings.read().unwrap().len() as i64)
    }
}
