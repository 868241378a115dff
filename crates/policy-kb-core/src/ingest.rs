//! Ingestion orchestration: content -> chunks -> vectors -> store.
//!
//! [`ingest`] coordinates the chunker, the embedder, and the store for one
//! new document. All chunks of a document are embedded in a single batch
//! call, and each resulting vector is persisted as an embedding row
//! referencing the resource created at the start of the call.
//!
//! Failures are reported as structured [`IngestError`] kinds rather than
//! message strings, so callers branch on the variant. A failure after the
//! resource insert leaves an embedding-less resource behind; that orphan
//! is invisible to retrieval (which only scans embedding rows) and a retry
//! simply creates a new resource.

use std::fmt;

use uuid::Uuid;

use crate::chunk::chunk_markdown;
use crate::embedding::Embedder;
use crate::models::{EmbeddingRow, IngestSummary, NewResource};
use crate::store::Store;

/// Why an ingestion attempt failed.
#[derive(Debug)]
pub enum IngestError {
    /// Empty or whitespace-only content; rejected before any write.
    Validation(String),
    /// The chunker produced zero chunks; a resource with no retrievable
    /// content is useless, so this is surfaced, not silently ignored.
    NoContentExtracted(String),
    /// The embedding call failed or violated the batch-order contract.
    Embedding(String),
    /// Persistence failed.
    Storage(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Validation(msg) => write!(f, "invalid content: {msg}"),
            IngestError::NoContentExtracted(msg) => write!(f, "{msg}"),
            IngestError::Embedding(msg) => write!(f, "embedding failed: {msg}"),
            IngestError::Storage(msg) => write!(f, "storage failed: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {}

/// Ingest one document into the knowledge base.
///
/// Steps, each a failure point: persist the resource, chunk the content,
/// batch-embed all chunks in one call, persist one embedding row per
/// chunk. Vectors are paired with chunks by index; the embedder must
/// return them in input order (see [`Embedder::embed_batch`]).
pub async fn ingest(
    store: &dyn Store,
    embedder: &dyn Embedder,
    content: &str,
    source_file: Option<&str>,
    policy_number: Option<&str>,
) -> Result<IngestSummary, IngestError> {
    if content.trim().is_empty() {
        return Err(IngestError::Validation(
            "content must not be empty".to_string(),
        ));
    }

    let resource = NewResource {
        content: content.to_string(),
        source_file: source_file.map(str::to_string),
        policy_number: policy_number.map(str::to_string),
    };
    let resource_id = store
        .insert_resource(&resource)
        .await
        .map_err(|e| IngestError::Storage(e.to_string()))?;

    let chunks = chunk_markdown(content);
    if chunks.is_empty() {
        return Err(IngestError::NoContentExtracted(
            "no embeddings generated: content may be too short".to_string(),
        ));
    }

    let vectors = embedder
        .embed_batch(&chunks)
        .await
        .map_err(|e| IngestError::Embedding(e.to_string()))?;
    if vectors.len() != chunks.len() {
        return Err(IngestError::Embedding(format!(
            "embedder returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        )));
    }

    let rows: Vec<EmbeddingRow> = chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| EmbeddingRow {
            id: Uuid::new_v4().to_string(),
            resource_id: resource_id.clone(),
            content: chunk,
            vector,
        })
        .collect();

    store
        .insert_embeddings(&rows)
        .await
        .map_err(|e| IngestError::Storage(e.to_string()))?;

    Ok(IngestSummary {
        resource_id,
        chunks_embedded: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::{bail, Result};
    use async_trait::async_trait;

    use super::*;
    use crate::store::MemoryStore;

    /// Deterministic embedder: chunk `i` of a batch gets the vector
    /// `[i+1, 0, 0, 0]`, and the batch input is recorded for inspection.
    struct IndexEmbedder {
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl IndexEmbedder {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Embedder for IndexEmbedder {
        fn model_name(&self) -> &str {
            "index-test"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0, 0.0, 0.0])
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batches.lock().unwrap().push(texts.to_vec());
            Ok((0..texts.len())
                .map(|i| vec![(i + 1) as f32, 0.0, 0.0, 0.0])
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            bail!("quota exceeded")
        }
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            bail!("quota exceeded")
        }
    }

    struct ShortBatchEmbedder;

    #[async_trait]
    impl Embedder for ShortBatchEmbedder {
        fn model_name(&self) -> &str {
            "short"
        }
        fn dims(&self) -> usize {
            1
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![])
        }
    }

    fn doc(sections: usize) -> String {
        (0..sections)
            .map(|i| {
                format!(
                    "# Section {i}\n{}",
                    format!("clause {i} ").repeat(30).trim_end()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn short_document_ingests_as_one_chunk() {
        let store = MemoryStore::new();
        let embedder = IndexEmbedder::new();

        // Exactly 150 characters, no headers.
        let content = "a".repeat(150);
        let summary = ingest(&store, &embedder, &content, None, None)
            .await
            .unwrap();

        assert_eq!(summary.chunks_embedded, 1);
        assert_eq!(store.resource_count().await.unwrap(), 1);
        assert_eq!(store.embedding_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn whitespace_only_content_is_rejected_before_any_write() {
        let store = MemoryStore::new();
        let embedder = IndexEmbedder::new();

        let err = ingest(&store, &embedder, "   \n\t  ", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
        assert_eq!(store.resource_count().await.unwrap(), 0);
        assert_eq!(store.embedding_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn undersized_content_fails_with_no_content_extracted() {
        let store = MemoryStore::new();
        let embedder = IndexEmbedder::new();

        let err = ingest(&store, &embedder, "too short to chunk", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NoContentExtracted(_)));
        // The resource insert precedes chunking; the orphan is accepted
        // and invisible to retrieval.
        assert_eq!(store.resource_count().await.unwrap(), 1);
        assert_eq!(store.embedding_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn embedding_failure_surfaces_as_embedding_error() {
        let store = MemoryStore::new();

        let err = ingest(&store, &FailingEmbedder, &doc(2), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Embedding(_)));
        assert_eq!(store.embedding_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn batch_length_mismatch_is_an_embedding_error() {
        let store = MemoryStore::new();

        let err = ingest(&store, &ShortBatchEmbedder, &doc(2), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Embedding(_)));
    }

    #[tokio::test]
    async fn chunks_are_embedded_in_document_order_and_paired_by_index() {
        let store = MemoryStore::new();
        let embedder = IndexEmbedder::new();

        let content = doc(3);
        let summary = ingest(&store, &embedder, &content, Some("P-006 Risk.pdf"), Some("P-006"))
            .await
            .unwrap();
        assert_eq!(summary.chunks_embedded, 3);

        // The single batch call received the chunks in document order.
        let batches = embedder.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert!(batches[0][0].starts_with("# Section 0"));
        assert!(batches[0][2].starts_with("# Section 2"));
        drop(batches);

        // Every persisted row carries the owning resource's metadata.
        let passages = store.scan_similar(&[1.0, 0.0, 0.0, 0.0]).await.unwrap();
        assert_eq!(passages.len(), 3);
        for p in &passages {
            assert_eq!(p.policy_number.as_deref(), Some("P-006"));
            assert_eq!(p.source_file.as_deref(), Some("P-006 Risk.pdf"));
        }
    }
}
