use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form metadata attached to a text unit. Loaders always set
/// `page` and `file_path`; anything else is informational.
pub type Metadata = Map<String, Value>;

pub const PAGE_KEY: &str = "page";
pub const FILE_PATH_KEY: &str = "file_path";
pub const SOURCE_KEY: &str = "source";
pub const TOTAL_PAGES_KEY: &str = "total_pages";

/// One extracted page of a PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    pub content: String,
    pub metadata: Metadata,
}

impl TextUnit {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Builds the metadata a loader attaches to a single page.
    pub fn page_metadata(file_path: &str, page: u32, total_pages: usize) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), Value::from(file_path));
        metadata.insert(FILE_PATH_KEY.to_string(), Value::from(file_path));
        metadata.insert(PAGE_KEY.to_string(), Value::from(page));
        metadata.insert(TOTAL_PAGES_KEY.to_string(), Value::from(total_pages));
        metadata
    }
}

/// Minimal (file name, page) pair naming where retrieved context came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRecord {
    pub source: String,
    pub page: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub unit: TextUnit,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetOutcome {
    Cleared,
    AlreadyEmpty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<CitationRecord>,
}
