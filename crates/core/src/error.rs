use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("vector index error: {0}")]
    Index(#[from] SearchError),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("search request failed: {0}")]
    Request(String),
}

impl SearchError {
    pub fn backend(backend: impl Into<String>, details: impl Into<String>) -> Self {
        Self::BackendResponse {
            backend: backend.into(),
            details: details.into(),
        }
    }
}

/// Raised when a text unit's metadata cannot produce a citation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("missing metadata field `{0}`")]
    MissingField(&'static str),

    #[error("metadata field `{field}` is not {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}
