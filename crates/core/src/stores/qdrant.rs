use crate::embeddings::Embedder;
use crate::traits::VectorIndex;
use crate::{Metadata, ResetOutcome, SearchError, SearchHit, TextUnit};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const BACKEND: &str = "qdrant";

/// Vector index backed by a Qdrant collection over its REST API. Page text
/// and metadata travel in each point's payload.
pub struct QdrantStore {
    endpoint: String,
    collection: String,
    client: Client,
    embedder: Arc<dyn Embedder>,
}

impl QdrantStore {
    pub fn new(
        endpoint: impl Into<String>,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            client: Client::new(),
            embedder,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }

    /// Creates the collection sized for the embedder if it doesn't exist yet.
    pub async fn ensure_collection(&self) -> Result<(), SearchError> {
        let response = self.client.get(self.collection_url()).send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Err(SearchError::backend(BACKEND, response.status().to_string()));
        }

        let response = self
            .client
            .put(self.collection_url())
            .json(&json!({
                "vectors": {
                    "size": self.embedder.dimensions(),
                    "distance": "Cosine",
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::backend(
                BACKEND,
                format!("collection setup failed with {}", response.status()),
            ));
        }

        tracing::info!(collection = %self.collection, "created qdrant collection");
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn add_documents(&self, units: Vec<TextUnit>) -> Result<(), SearchError> {
        if units.is_empty() {
            return Ok(());
        }

        let texts = units
            .iter()
            .map(|unit| unit.content.clone())
            .collect::<Vec<_>>();
        let embeddings = self.embedder.embed_documents(&texts).await?;
        let points = build_points(&units, &embeddings, self.embedder.dimensions())?;

        self.ensure_collection().await?;

        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::backend(BACKEND, response.status().to_string()));
        }

        Ok(())
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query).await?;
        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&json!({
                "vector": query_vector,
                "limit": k,
                "with_payload": true,
            }))
            .send()
            .await?;

        // A collection that was never written to (or was just reset) is empty.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(SearchError::backend(BACKEND, response.status().to_string()));
        }

        let parsed: Value = response.json().await?;
        Ok(parse_hits(&parsed))
    }

    async fn count(&self) -> Result<usize, SearchError> {
        let response = self
            .client
            .post(format!("{}/points/count", self.collection_url()))
            .json(&json!({ "exact": true }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        if !response.status().is_success() {
            return Err(SearchError::backend(BACKEND, response.status().to_string()));
        }

        let parsed: Value = response.json().await?;
        Ok(parsed
            .pointer("/result/count")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize)
    }

    async fn reset(&self) -> Result<ResetOutcome, SearchError> {
        let response = self.client.delete(self.collection_url()).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ResetOutcome::AlreadyEmpty);
        }
        if !response.status().is_success() {
            return Err(SearchError::backend(BACKEND, response.status().to_string()));
        }

        // Qdrant answers 200 with `result: false` when there was nothing to drop.
        let parsed: Value = response.json().await?;
        if parsed.pointer("/result").and_then(Value::as_bool) == Some(false) {
            return Ok(ResetOutcome::AlreadyEmpty);
        }
        Ok(ResetOutcome::Cleared)
    }
}

fn build_points(
    units: &[TextUnit],
    embeddings: &[Vec<f32>],
    dimensions: usize,
) -> Result<Vec<Value>, SearchError> {
    if units.len() != embeddings.len() {
        return Err(SearchError::Request(format!(
            "embedding count {} doesn't match unit count {}",
            embeddings.len(),
            units.len()
        )));
    }

    units
        .iter()
        .zip(embeddings)
        .map(|(unit, embedding)| {
            if embedding.len() != dimensions {
                return Err(SearchError::Request(format!(
                    "embedding dimension {} != {}",
                    embedding.len(),
                    dimensions
                )));
            }

            Ok(json!({
                "id": Uuid::new_v4().to_string(),
                "vector": embedding,
                "payload": {
                    "content": unit.content,
                    "metadata": unit.metadata,
                },
            }))
        })
        .collect()
}

fn parse_hits(parsed: &Value) -> Vec<SearchHit> {
    let hits = parsed
        .pointer("/result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    hits.into_iter()
        .map(|hit| {
            let content = hit
                .pointer("/payload/content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let metadata = hit
                .pointer("/payload/metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_else(Metadata::new);
            let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0);

            SearchHit {
                unit: TextUnit::new(content, metadata),
                score: score as f32,
            }
        })
        .collect()
}
