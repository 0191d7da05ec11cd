use crate::{ResetOutcome, SearchError, SearchHit, TextUnit};
use async_trait::async_trait;

/// A persistent collection of embedded text units. Implementations embed
/// through their own configured embedder.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embeds and stores the batch. Either every unit is stored or none.
    async fn add_documents(&self, units: Vec<TextUnit>) -> Result<(), SearchError>;

    /// Up to `k` nearest units to `query`, best first.
    async fn similarity_search(&self, query: &str, k: usize)
        -> Result<Vec<SearchHit>, SearchError>;

    async fn count(&self) -> Result<usize, SearchError>;

    async fn reset(&self) -> Result<ResetOutcome, SearchError>;
}
