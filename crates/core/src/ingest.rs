use crate::citation::format_source;
use crate::traits::VectorIndex;
use crate::{IngestError, TextUnit};

/// Writes a batch of text units into the index.
///
/// Every unit is checked for the `page` and `file_path` metadata that
/// citations depend on before anything is written, so a bad unit rejects
/// the whole batch.
pub async fn ingest_documents<V>(store: &V, documents: Vec<TextUnit>) -> Result<(), IngestError>
where
    V: VectorIndex + ?Sized,
{
    for unit in &documents {
        format_source(&unit.metadata)?;
    }

    let count = documents.len();
    store.add_documents(documents).await?;
    tracing::info!(units = count, "ingested text units");
    Ok(())
}
