use crate::error::SearchError;
use crate::openai::{post_json, OpenAiConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 3072;
pub const DEFAULT_HASHING_DIMENSIONS: usize = 128;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| SearchError::Request("embedder returned no vector".to_string()))
    }
}

/// Deterministic character-trigram embedder. Needs no network, so it backs
/// offline runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    pub dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_HASHING_DIMENSIONS,
        }
    }
}

impl HashingEmbedder {
    /// Buckets lowercase character trigrams into an L2-normalised vector.
    /// Text shorter than a trigram counts as a single token.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let width = self.dimensions.max(1);
        let chars = text.to_lowercase().chars().collect::<Vec<_>>();

        let mut vector = vec![0f32; width];
        if chars.is_empty() {
            return vector;
        }
        for token in chars.windows(chars.len().min(3)) {
            vector[(fnv1a(token) % width as u64) as usize] += 1.0;
        }

        l2_normalize(&mut vector);
        vector
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn fnv1a(token: &[char]) -> u64 {
    token
        .iter()
        .collect::<String>()
        .bytes()
        .fold(FNV_OFFSET, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|value| *value /= norm);
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions.max(1)
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Calls `POST {base}/embeddings`.
pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiConfig,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiConfig, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: Client::new(),
            config,
            model: model.into(),
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        };
        let response: EmbeddingResponse =
            post_json(&self.client, &self.config, "embeddings", &request).await?;

        tracing::debug!(model = %self.model, inputs = texts.len(), "embedded batch");
        order_embeddings(response, texts.len())
    }
}

fn order_embeddings(
    mut response: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, SearchError> {
    if response.data.len() != expected {
        return Err(SearchError::backend(
            "openai",
            format!(
                "embedding count {} doesn't match input count {}",
                response.data.len(),
                expected
            ),
        ));
    }

    response.data.sort_by_key(|datum| datum.index);
    Ok(response
        .data
        .into_iter()
        .map(|datum| datum.embedding)
        .collect())
}
