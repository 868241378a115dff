//! Storage abstraction for Policy KB.
//!
//! The [`Store`] trait defines the access pattern the ingestion and
//! retrieval pipeline needs: append a resource, append its embedding rows,
//! and scan all embeddings by similarity. Resources and embeddings are
//! independent append-only rows, so concurrent callers need no cross-call
//! coordination.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{EmbeddingRow, NewResource, SimilarPassage};

pub use memory::MemoryStore;

/// Abstract storage backend for Policy KB.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_resource`](Store::insert_resource) | Persist a new resource, returning its ID |
/// | [`insert_embeddings`](Store::insert_embeddings) | Persist a batch of embedding rows |
/// | [`scan_similar`](Store::scan_similar) | Score every stored embedding against a query vector |
/// | [`resource_count`](Store::resource_count) | Total resources |
/// | [`embedding_count`](Store::embedding_count) | Total embedding rows |
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a new resource and return its assigned ID.
    ///
    /// Resources are immutable once inserted; there is no update path.
    async fn insert_resource(&self, resource: &NewResource) -> Result<String>;

    /// Persist a batch of embedding rows, each referencing its resource.
    async fn insert_embeddings(&self, rows: &[EmbeddingRow]) -> Result<()>;

    /// Compute cosine similarity of every stored embedding against
    /// `query_vec`, joined with the owning resource's provenance metadata.
    ///
    /// This is a full scan, unfiltered and unordered; thresholding and
    /// ranking happen in the retriever.
    async fn scan_similar(&self, query_vec: &[f32]) -> Result<Vec<SimilarPassage>>;

    /// Total number of resources in the store.
    async fn resource_count(&self) -> Result<i64>;

    /// Total number of embedding rows in the store.
    async fn embedding_count(&self) -> Result<i64>;
}
