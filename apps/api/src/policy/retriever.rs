use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::policy::ChunkMetadata;
use crate::policy::embedding::{EmbedError, Embedder};
use crate::policy::index::{IndexError, VectorIndex};

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("Query embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// A search hit, detached from the snapshot it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    /// Top-`k` chunks for `query`, best first. An empty index short-circuits before
    /// the embedder is called.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, RetrieveError> {
        let snapshot = self.index.snapshot().await;
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed_one(query).await?;
        let hits = snapshot.search(&query_vec, k)?;
        debug!("Retrieved {} chunks (k={})", hits.len(), k);

        Ok(hits
            .into_iter()
            .map(|(score, entry)| RetrievedChunk {
                text: entry.chunk.text.clone(),
                metadata: entry.chunk.metadata.clone(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::policy::PolicyDocument;
    use crate::policy::chunker::Chunker;
    use crate::policy::embedding::HashingEmbedder;
    use crate::policy::index::IndexEntry;
    use crate::test_support::FailingEmbedder;

    async fn seeded_index(dir: &std::path::Path, embedder: &HashingEmbedder) -> Arc<VectorIndex> {
        let index = VectorIndex::open(dir, "policies").await.unwrap();
        let chunker = Chunker::new(1000, 200).unwrap();
        let docs = [
            PolicyDocument::new("Leave", "Employees get 20 vacation days per year."),
            PolicyDocument::new("Expenses", "Expense reports require manager approval."),
            PolicyDocument::new("Remote", "Remote work needs a signed agreement."),
        ];
        let entries = docs
            .iter()
            .flat_map(|d| chunker.chunk(d))
            .map(|chunk| IndexEntry {
                embedding: embedder.embed_text(&chunk.text),
                chunk,
            })
            .collect();
        index.replace(entries).await.unwrap();
        Arc::new(index)
    }

    #[tokio::test]
    async fn test_retrieve_ranks_relevant_policy_first() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = HashingEmbedder::new(512);
        let index = seeded_index(dir.path(), &embedder).await;
        let retriever = Retriever::new(index, Arc::new(embedder));

        let hits = retriever
            .retrieve("how many vacation days do employees get", 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].metadata.policy_name, "Leave");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_empty_index_skips_embedder() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(VectorIndex::open(dir.path(), "policies").await.unwrap());
        let retriever = Retriever::new(index, Arc::new(FailingEmbedder::new(8)));
        let hits = retriever.retrieve("anything", 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let index = seeded_index(dir.path(), &HashingEmbedder::new(8)).await;
        let retriever = Retriever::new(index, Arc::new(FailingEmbedder::new(8)));
        assert!(matches!(
            retriever.retrieve("vacation", 5).await,
            Err(RetrieveError::Embed(_))
        ));
    }
}
