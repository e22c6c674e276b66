//! Vector memory: durable text records with embeddings and cosine recall.

mod embed;

pub use embed::{cosine, fallback_embedding, EMBED_INPUT_MAX, FALLBACK_DIMS};

use crate::provider::TextProvider;
use crate::shared::{now_ms, BoxError};
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::sync::Arc;

const TREE_MEMORY: &str = "memory";

/// Recall scans at most this many of the newest records.
const RECALL_WINDOW: usize = 1_000;

/// One durable memory: the original text plus its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: u64,
    pub ts_ms: i64,
    pub text: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl MemoryRecord {
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

/// A recall hit: the record minus its vector, plus the similarity score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMemory {
    pub id: u64,
    pub ts_ms: i64,
    pub text: String,
    pub meta: serde_json::Value,
    pub score: f32,
}

/// Sled-backed vector store. Records are keyed by big-endian store-assigned
/// id so reverse iteration yields newest-first.
pub struct VectorMemory {
    db: Db,
    tree: Tree,
    provider: Arc<dyn TextProvider>,
}

impl VectorMemory {
    pub fn open(db: &Db, provider: Arc<dyn TextProvider>) -> Result<Self, sled::Error> {
        let tree = db.open_tree(TREE_MEMORY)?;
        Ok(Self {
            db: db.clone(),
            tree,
            provider,
        })
    }

    /// Embeds `text` and persists it as a new record, returning its id.
    pub async fn ingest(&self, text: &str, meta: serde_json::Value) -> Result<u64, BoxError> {
        let vector = self.provider.embed(text).await?;
        let id = self.db.generate_id()?;
        let record = MemoryRecord {
            id,
            ts_ms: now_ms(),
            text: text.to_string(),
            vector,
            meta,
        };
        self.tree.insert(id.to_be_bytes(), record.to_bytes())?;
        tracing::debug!(target: "mind::memory", id, chars = text.len(), "memory ingested");
        Ok(id)
    }

    /// Top-`k` records by cosine similarity to `query`, scanning the newest
    /// [`RECALL_WINDOW`] records. Ties break toward the older record.
    pub async fn recall(&self, query: &str, k: usize) -> Result<Vec<ScoredMemory>, BoxError> {
        let query_vector = self.provider.embed(query).await?;
        let mut scored = Vec::new();
        for item in self.tree.iter().rev().take(RECALL_WINDOW) {
            let (_key, value) = item?;
            let Some(record) = MemoryRecord::from_bytes(&value) else {
                continue;
            };
            let score = cosine(&query_vector, &record.vector);
            scored.push(ScoredMemory {
                id: record.id,
                ts_ms: record.ts_ms,
                text: record.text,
                meta: record.meta,
                score,
            });
        }
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LocalProvider;

    fn test_memory() -> (tempfile::TempDir, VectorMemory) {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path().join("mind")).unwrap();
        let memory = VectorMemory::open(&db, Arc::new(LocalProvider)).unwrap();
        (dir, memory)
    }

    #[tokio::test]
    async fn ingest_assigns_increasing_ids() {
        let (_dir, memory) = test_memory();
        let a = memory.ingest("first", serde_json::json!({})).await.unwrap();
        let b = memory.ingest("second", serde_json::json!({})).await.unwrap();
        assert!(a < b);
        assert_eq!(memory.len(), 2);
    }

    #[tokio::test]
    async fn recall_ranks_exact_match_first() {
        let (_dir, memory) = test_memory();
        memory
            .ingest("the garden is full of tulips", serde_json::json!({}))
            .await
            .unwrap();
        memory
            .ingest("quarterly revenue grew by nine percent", serde_json::json!({}))
            .await
            .unwrap();
        memory
            .ingest("zzzz 9999 ####", serde_json::json!({}))
            .await
            .unwrap();

        let hits = memory
            .recall("the garden is full of tulips", 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "the garden is full of tulips");
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn recall_k_larger_than_store_returns_all() {
        let (_dir, memory) = test_memory();
        memory.ingest("only one", serde_json::json!({})).await.unwrap();
        let hits = memory.recall("anything", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn recall_on_empty_store_is_empty() {
        let (_dir, memory) = test_memory();
        assert!(memory.recall("anything", 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn equal_scores_break_toward_older_record() {
        let (_dir, memory) = test_memory();
        let older = memory.ingest("same text", serde_json::json!({})).await.unwrap();
        let newer = memory.ingest("same text", serde_json::json!({})).await.unwrap();
        let hits = memory.recall("same text", 2).await.unwrap();
        assert_eq!(hits[0].id, older);
        assert_eq!(hits[1].id, newer);
    }
}
