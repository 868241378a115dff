//! Core data models used throughout Policy KB.
//!
//! These types represent the resources, embedding rows, and retrieved
//! passages that flow through the ingestion and retrieval pipeline.

use serde::Serialize;

/// A document (or inline fact) to be contributed to the knowledge base.
#[derive(Debug, Clone)]
pub struct NewResource {
    /// Full text as ingested.
    pub content: String,
    /// Origin file name; `None` for inline user-supplied facts.
    pub source_file: Option<String>,
    /// Policy identifier extracted from the file name (e.g. `P-018`).
    pub policy_number: Option<String>,
}

/// A persisted resource. Immutable once created: corrections are new
/// resources, and no update or delete path exists in this core.
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: String,
    pub content: String,
    pub source_file: Option<String>,
    pub policy_number: Option<String>,
    /// Unix seconds.
    pub created_at: i64,
}

/// The persisted unit of retrieval: one chunk of a resource's text paired
/// with its embedding vector.
#[derive(Debug, Clone)]
pub struct EmbeddingRow {
    pub id: String,
    /// Owning resource. Many embeddings per resource.
    pub resource_id: String,
    /// The chunk text.
    pub content: String,
    /// Fixed dimensionality across the whole store (one embedding model).
    pub vector: Vec<f32>,
}

/// A retrieved passage with provenance metadata for citation.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarPassage {
    /// The chunk text.
    pub content: String,
    /// Cosine similarity to the query, in `[-1.0, 1.0]`.
    pub similarity: f64,
    /// Origin file of the owning resource, if any.
    pub source_file: Option<String>,
    /// Policy identifier of the owning resource, if any.
    pub policy_number: Option<String>,
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    /// ID of the resource created by this ingestion.
    pub resource_id: String,
    /// Number of chunks embedded and persisted.
    pub chunks_embedded: usize,
}
