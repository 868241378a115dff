//! # Policy KB
//!
//! A local-first knowledge base for compliance policy documents. Documents
//! are chunked on markdown header boundaries, embedded, and stored in
//! SQLite; questions are answered by cosine-similarity retrieval over the
//! stored vectors.
//!
//! The retrieval-agnostic pipeline (chunking, embedding traits, the store
//! abstraction, similarity ranking) lives in `policy-kb-core`; this crate
//! supplies the SQLite backend, the embedding and PDF parsing providers,
//! the TOML configuration layer, and the `pkb` CLI.

pub mod config;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod migrate;
pub mod parser;
pub mod query;
pub mod sqlite_store;
pub mod stats;
