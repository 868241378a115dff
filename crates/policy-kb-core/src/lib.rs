//! # Policy KB Core
//!
//! Shared, runtime-agnostic logic for Policy KB: data models, the
//! markdown-aware chunker, the store abstraction, the ingestion
//! orchestrator, the similarity retriever, and the embedder trait.
//!
//! This crate contains no tokio runtime, sqlx, filesystem I/O, or other
//! native-only dependencies. Concrete embedding providers and the SQLite
//! store live in the `policy-kb` app crate.

pub mod chunk;
pub mod embedding;
pub mod ingest;
pub mod models;
pub mod policy;
pub mod retrieve;
pub mod store;
