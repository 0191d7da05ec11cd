pub mod chat;
pub mod citation;
pub mod embeddings;
pub mod error;
pub mod extractor;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
pub mod ingest;
pub mod models;
pub mod openai;
pub mod query;
pub mod stores;
pub mod traits;
pub mod uploads;

pub use chat::{ChatMessage, ChatModel, OpenAiChatModel, Role, DEFAULT_CHAT_MODEL};
pub use citation::format_source;
pub use embeddings::{
    Embedder, HashingEmbedder, OpenAiEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_EMBEDDING_MODEL,
};
pub use error::{IngestError, MetadataError, QueryError, SearchError};
pub use extractor::{extract_documents, DocumentLoader, LoaderKind, LopdfLoader, PdfExtractLoader};
pub use ingest::ingest_documents;
pub use models::{Answer, CitationRecord, Metadata, ResetOutcome, SearchHit, TextUnit};
pub use openai::OpenAiConfig;
pub use query::{PromptTemplate, QueryService, DEFAULT_TOP_K};
pub use stores::{LocalVectorStore, QdrantStore};
pub use traits::VectorIndex;
pub use uploads::{is_pdf_filename, UploadStore};
