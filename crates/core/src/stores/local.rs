use crate::embeddings::Embedder;
use crate::traits::VectorIndex;
use crate::{Metadata, ResetOutcome, SearchError, SearchHit, TextUnit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    id: Uuid,
    embedding: Vec<f32>,
    content: String,
    metadata: Metadata,
    ingested_at: DateTime<Utc>,
}

/// A collection persisted as one JSON file under a local directory and
/// searched by brute-force cosine similarity.
pub struct LocalVectorStore {
    path: PathBuf,
    embedder: Arc<dyn Embedder>,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl LocalVectorStore {
    /// Opens `<persist_dir>/<collection>.json`, loading whatever an earlier
    /// process persisted.
    pub async fn open(
        persist_dir: impl AsRef<Path>,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, SearchError> {
        let persist_dir = persist_dir.as_ref();
        tokio::fs::create_dir_all(persist_dir).await?;
        let path = persist_dir.join(format!("{collection}.json"));

        let chunks: Vec<StoredChunk> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(error) => return Err(error.into()),
        };
        if let Some(chunk) = chunks.first() {
            check_dimensions(chunk.embedding.len(), embedder.dimensions())?;
        }
        tracing::info!(path = %path.display(), chunks = chunks.len(), "opened local vector store");

        Ok(Self {
            path,
            embedder,
            chunks: RwLock::new(chunks),
        })
    }

    async fn persist(&self, chunks: &[StoredChunk]) -> Result<(), SearchError> {
        let bytes = serde_json::to_vec(chunks)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for LocalVectorStore {
    async fn add_documents(&self, units: Vec<TextUnit>) -> Result<(), SearchError> {
        if units.is_empty() {
            return Ok(());
        }

        let texts = units
            .iter()
            .map(|unit| unit.content.clone())
            .collect::<Vec<_>>();
        let embeddings = self.embedder.embed_documents(&texts).await?;
        if embeddings.len() != units.len() {
            return Err(SearchError::Request(format!(
                "embedding count {} doesn't match unit count {}",
                embeddings.len(),
                units.len()
            )));
        }
        for embedding in &embeddings {
            check_dimensions(self.embedder.dimensions(), embedding.len())?;
        }

        let ingested_at = Utc::now();
        let new_chunks = units
            .into_iter()
            .zip(embeddings)
            .map(|(unit, embedding)| StoredChunk {
                id: Uuid::new_v4(),
                embedding,
                content: unit.content,
                metadata: unit.metadata,
                ingested_at,
            })
            .collect::<Vec<_>>();
        let added = new_chunks.len();

        let mut chunks = self.chunks.write().await;
        let previous_len = chunks.len();
        chunks.extend(new_chunks);

        if let Err(error) = self.persist(&chunks).await {
            chunks.truncate(previous_len);
            return Err(error);
        }

        tracing::debug!(added, total = chunks.len(), "persisted local vector store");
        Ok(())
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if k == 0 || self.chunks.read().await.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query).await?;
        let chunks = self.chunks.read().await;
        if let Some(chunk) = chunks.first() {
            check_dimensions(chunk.embedding.len(), query_vector.len())?;
        }

        let mut scored = chunks
            .iter()
            .map(|chunk| (cosine_similarity(&query_vector, &chunk.embedding), chunk))
            .collect::<Vec<_>>();
        scored.sort_by(|left, right| right.0.total_cmp(&left.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, chunk)| SearchHit {
                unit: TextUnit::new(chunk.content.clone(), chunk.metadata.clone()),
                score,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, SearchError> {
        Ok(self.chunks.read().await.len())
    }

    async fn reset(&self) -> Result<ResetOutcome, SearchError> {
        let mut chunks = self.chunks.write().await;
        let had_chunks = !chunks.is_empty();

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }
        chunks.clear();

        Ok(if had_chunks {
            ResetOutcome::Cleared
        } else {
            ResetOutcome::AlreadyEmpty
        })
    }
}

/// Every vector in a collection has the width of the first one stored.
fn check_dimensions(expected: usize, actual: usize) -> Result<(), SearchError> {
    if expected == actual {
        return Ok(());
    }
    Err(SearchError::Request(format!(
        "embedding dimension {actual} doesn't match collection dimension {expected}; \
         reset the collection or restore the previous embedding settings"
    )))
}

fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    let dot = left.iter().zip(right).map(|(a, b)| a * b).sum::<f32>();
    let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();

    if left_norm == 0.0 || right_norm == 0.0 {
        0.0
    } else {
        dot / (left_norm * right_norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use tempfile::tempdir;

    fn unit(content: &str, page: u32) -> TextUnit {
        TextUnit::new(
            content,
            TextUnit::page_metadata("/uploads/report.pdf", page, 3),
        )
    }

    async fn open(dir: &Path) -> LocalVectorStore {
        LocalVectorStore::open(dir, "pdf_collection", Arc::new(HashingEmbedder::default()))
            .await
            .expect("store opens")
    }

    #[tokio::test]
    async fn nearest_unit_ranks_first() {
        let dir = tempdir().unwrap();
        let store = open(dir.path()).await;
        store
            .add_documents(vec![
                unit("Wines & Spirits revenue declined in the year", 0),
                unit("Perfumes & Cosmetics grew organically", 1),
                unit("Selective Retailing includes Sephora and DFS", 2),
            ])
            .await
            .unwrap();

        let hits = store
            .similarity_search("Selective Retailing includes Sephora", 3)
            .await
            .unwrap();

        assert_eq!(hits.len(), 3);
        assert!(hits[0].unit.content.contains("Sephora"));
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[1].score >= hits[2].score);
    }

    #[tokio::test]
    async fn search_returns_at_most_what_is_stored() {
        let dir = tempdir().unwrap();
        let store = open(dir.path()).await;
        assert!(store.similarity_search("anything", 3).await.unwrap().is_empty());

        store.add_documents(vec![unit("only page", 0)]).await.unwrap();
        assert_eq!(store.similarity_search("anything", 3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn collection_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = open(dir.path()).await;
            store
                .add_documents(vec![unit("first", 0), unit("second", 1)])
                .await
                .unwrap();
        }

        let reopened = open(dir.path()).await;
        assert_eq!(reopened.count().await.unwrap(), 2);
        let hits = reopened.similarity_search("second", 1).await.unwrap();
        assert_eq!(hits[0].unit.metadata["page"], 1);
    }

    #[tokio::test]
    async fn reset_distinguishes_cleared_from_empty() {
        let dir = tempdir().unwrap();
        let store = open(dir.path()).await;
        store.add_documents(vec![unit("page", 0)]).await.unwrap();

        assert_eq!(store.reset().await.unwrap(), ResetOutcome::Cleared);
        assert_eq!(store.reset().await.unwrap(), ResetOutcome::AlreadyEmpty);
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(open(dir.path()).await.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reopening_with_another_width_is_refused() {
        let dir = tempdir().unwrap();
        {
            let narrow = LocalVectorStore::open(
                dir.path(),
                "pdf_collection",
                Arc::new(HashingEmbedder { dimensions: 64 }),
            )
            .await
            .unwrap();
            narrow
                .add_documents(vec![unit("Wines revenue", 0), unit("Sephora retailing", 1)])
                .await
                .unwrap();
        }

        let reopened = LocalVectorStore::open(
            dir.path(),
            "pdf_collection",
            Arc::new(HashingEmbedder { dimensions: 128 }),
        )
        .await;

        match reopened {
            Err(SearchError::Request(message)) => assert!(message.contains("64")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("mismatched collection opened"),
        }
    }

    /// Lies about its width, the way a misconfigured remote model would.
    struct WrongWidth;

    #[async_trait]
    impl Embedder for WrongWidth {
        fn dimensions(&self) -> usize {
            128
        }

        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
            Ok(texts.iter().map(|_| vec![1.0; 32]).collect())
        }
    }

    #[tokio::test]
    async fn vectors_of_the_wrong_width_are_not_stored() {
        let dir = tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path(), "pdf_collection", Arc::new(WrongWidth))
            .await
            .unwrap();

        let result = store.add_documents(vec![unit("page", 0)]).await;

        assert!(matches!(result, Err(SearchError::Request(_))));
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(!dir.path().join("pdf_collection.json").exists());
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < f32::EPSILON);
    }
}
