//! Similarity retrieval over the embedding store.
//!
//! [`retrieve`] embeds a question, scans every stored embedding, and
//! returns the passages above the similarity threshold, best first. The
//! store reports raw scores; thresholding, ranking, and the result cap
//! all live here so every backend ranks identically.

use anyhow::Result;

use crate::embedding::Embedder;
use crate::models::SimilarPassage;
use crate::store::Store;

/// Passages scoring at or below this are considered noise and dropped.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Maximum passages returned per query.
pub const DEFAULT_MAX_RESULTS: usize = 8;

/// Tuning knobs for a retrieval call.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalParams {
    /// Strict lower bound on similarity; matches must score above it.
    pub similarity_threshold: f64,
    /// Cap on the number of passages returned.
    pub max_results: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Find the stored passages most similar to `query`.
///
/// The query is normalized (literal `\n` sequences become spaces, matching
/// how chat transports escape newlines) before embedding. Results are
/// sorted by similarity descending and truncated to `max_results`; an
/// empty query or an empty store yields an empty list, not an error.
pub async fn retrieve(
    store: &dyn Store,
    embedder: &dyn Embedder,
    query: &str,
    params: &RetrievalParams,
) -> Result<Vec<SimilarPassage>> {
    let query = query.replace("\\n", " ");
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let query_vec = embedder.embed(&query).await?;
    let mut passages = store.scan_similar(&query_vec).await?;

    passages.retain(|p| p.similarity > params.similarity_threshold);
    passages.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    passages.truncate(params.max_results);

    Ok(passages)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::models::{EmbeddingRow, NewResource};
    use crate::store::MemoryStore;

    /// Returns a fixed unit vector and records the text it was asked to
    /// embed, so tests can steer scores via stored vectors and inspect
    /// query normalization.
    struct FixedEmbedder {
        vector: Vec<f32>,
        last_query: Mutex<Option<String>>,
    }

    impl FixedEmbedder {
        fn new(vector: Vec<f32>) -> Self {
            Self {
                vector,
                last_query: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn model_name(&self) -> &str {
            "fixed-test"
        }
        fn dims(&self) -> usize {
            self.vector.len()
        }
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            *self.last_query.lock().unwrap() = Some(text.to_string());
            Ok(self.vector.clone())
        }
        async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.vector.clone()).collect())
        }
    }

    /// Store stub returning canned scan results, for exercising the
    /// threshold boundary with exact scores.
    struct CannedStore {
        passages: Vec<SimilarPassage>,
    }

    #[async_trait]
    impl crate::store::Store for CannedStore {
        async fn insert_resource(&self, _resource: &NewResource) -> anyhow::Result<String> {
            unimplemented!("read-only stub")
        }
        async fn insert_embeddings(&self, _rows: &[EmbeddingRow]) -> anyhow::Result<()> {
            unimplemented!("read-only stub")
        }
        async fn scan_similar(&self, _query_vec: &[f32]) -> anyhow::Result<Vec<SimilarPassage>> {
            Ok(self.passages.clone())
        }
        async fn resource_count(&self) -> anyhow::Result<i64> {
            Ok(0)
        }
        async fn embedding_count(&self) -> anyhow::Result<i64> {
            Ok(self.passages.len() as i64)
        }
    }

    fn passage(content: &str, similarity: f64) -> SimilarPassage {
        SimilarPassage {
            content: content.to_string(),
            similarity,
            source_file: None,
            policy_number: None,
        }
    }

    /// Seed the store with one resource and one embedding row per entry,
    /// where the vector's angle to the x axis controls its score.
    async fn seed(store: &MemoryStore, entries: &[(&str, Vec<f32>)]) {
        for (content, vector) in entries {
            let resource_id = store
                .insert_resource(&NewResource {
                    content: content.to_string(),
                    source_file: Some(format!("{content}.pdf")),
                    policy_number: None,
                })
                .await
                .unwrap();
            store
                .insert_embeddings(&[EmbeddingRow {
                    id: Uuid::new_v4().to_string(),
                    resource_id,
                    content: content.to_string(),
                    vector: vector.clone(),
                }])
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn empty_store_yields_no_results() {
        let store = MemoryStore::new();
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);

        let results = retrieve(&store, &embedder, "anything", &RetrievalParams::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn empty_query_short_circuits_without_embedding() {
        let store = MemoryStore::new();
        seed(&store, &[("passage", vec![1.0, 0.0])]).await;
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);

        let results = retrieve(&store, &embedder, "  \t ", &RetrievalParams::default())
            .await
            .unwrap();
        assert!(results.is_empty());
        assert!(embedder.last_query.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn threshold_is_a_strict_lower_bound() {
        let store = CannedStore {
            passages: vec![
                passage("at threshold", 0.3),
                passage("above threshold", 0.9),
                passage("below threshold", 0.1),
            ],
        };
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);

        let results = retrieve(&store, &embedder, "question", &RetrievalParams::default())
            .await
            .unwrap();
        // A score exactly at the threshold is dropped.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "above threshold");
    }

    #[tokio::test]
    async fn results_are_sorted_descending_and_capped() {
        let store = MemoryStore::new();
        // Ten passages with distinct scores, all above the threshold.
        let entries: Vec<(String, Vec<f32>)> = (0..10)
            .map(|i| {
                let score = 0.5 + 0.04 * i as f32;
                (format!("passage {i}"), vec![score, (1.0 - score * score).sqrt()])
            })
            .collect();
        let refs: Vec<(&str, Vec<f32>)> = entries
            .iter()
            .map(|(c, v)| (c.as_str(), v.clone()))
            .collect();
        seed(&store, &refs).await;
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);

        let results = retrieve(&store, &embedder, "question", &RetrievalParams::default())
            .await
            .unwrap();
        assert_eq!(results.len(), DEFAULT_MAX_RESULTS);
        assert_eq!(results[0].content, "passage 9");
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        // The two lowest-scoring passages fell off the cap.
        assert!(results.iter().all(|p| p.content != "passage 0"));
        assert!(results.iter().all(|p| p.content != "passage 1"));
    }

    #[tokio::test]
    async fn custom_params_override_defaults() {
        let store = MemoryStore::new();
        seed(
            &store,
            &[
                ("strong", vec![0.95, (1.0f32 - 0.9025).sqrt()]),
                ("weak", vec![0.5, (1.0f32 - 0.25).sqrt()]),
            ],
        )
        .await;
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);

        let params = RetrievalParams {
            similarity_threshold: 0.9,
            max_results: 1,
        };
        let results = retrieve(&store, &embedder, "question", &params).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "strong");
    }

    #[tokio::test]
    async fn literal_backslash_n_sequences_become_spaces() {
        let store = MemoryStore::new();
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);

        retrieve(
            &store,
            &embedder,
            "what is\\nthe retention\\nperiod",
            &RetrievalParams::default(),
        )
        .await
        .unwrap();

        let seen = embedder.last_query.lock().unwrap().clone().unwrap();
        assert_eq!(seen, "what is the retention period");
    }

    #[tokio::test]
    async fn repeated_queries_return_identical_rankings() {
        let store = MemoryStore::new();
        seed(
            &store,
            &[
                ("first", vec![0.9, (1.0f32 - 0.81).sqrt()]),
                ("second", vec![0.7, (1.0f32 - 0.49).sqrt()]),
                ("third", vec![0.5, (1.0f32 - 0.25).sqrt()]),
            ],
        )
        .await;
        let embedder = FixedEmbedder::new(vec![1.0, 0.0]);

        let params = RetrievalParams::default();
        let a = retrieve(&store, &embedder, "question", &params).await.unwrap();
        let b = retrieve(&store, &embedder, "question", &params).await.unwrap();
        let order = |rs: &[crate::models::SimilarPassage]| {
            rs.iter().map(|p| p.content.clone()).collect::<Vec<_>>()
        };
        assert_eq!(order(&a), order(&b));
        assert_eq!(order(&a), vec!["first", "second", "third"]);
    }
}
