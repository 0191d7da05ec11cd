use crate::error::IngestError;
use crate::models::TextUnit;
use lopdf::Document;
use std::path::{Path, PathBuf};

/// A loader bound to one file on disk, producing one text unit per page.
pub trait DocumentLoader {
    fn load(&self) -> Result<Vec<TextUnit>, IngestError>;
}

/// Runs a loader and hands back its pages untouched, in the loader's order.
pub fn extract_documents<L>(loader: &L) -> Result<Vec<TextUnit>, IngestError>
where
    L: DocumentLoader + ?Sized,
{
    loader.load()
}

/// Page-by-page extraction through lopdf's content stream decoder.
#[derive(Debug, Clone)]
pub struct LopdfLoader {
    path: PathBuf,
}

impl LopdfLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentLoader for LopdfLoader {
    fn load(&self) -> Result<Vec<TextUnit>, IngestError> {
        let document =
            Document::load(&self.path).map_err(|error| IngestError::PdfParse(error.to_string()))?;
        let file_path = path_string(&self.path);

        let pages = document.get_pages();
        let total_pages = pages.len();
        let mut units = Vec::with_capacity(total_pages);

        for page_no in pages.keys() {
            let text = document
                .extract_text(&[*page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;

            units.push(TextUnit::new(
                text,
                TextUnit::page_metadata(&file_path, page_no.saturating_sub(1), total_pages),
            ));
        }

        Ok(units)
    }
}

/// Extraction through pdf-extract's layout-aware text output.
#[derive(Debug, Clone)]
pub struct PdfExtractLoader {
    path: PathBuf,
}

impl PdfExtractLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentLoader for PdfExtractLoader {
    fn load(&self) -> Result<Vec<TextUnit>, IngestError> {
        if !self.path.is_file() {
            return Err(IngestError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", self.path.display()),
            )));
        }

        let pages = pdf_extract::extract_text_by_pages(&self.path)
            .map_err(|error| IngestError::PdfParse(error.to_string()))?;
        let file_path = path_string(&self.path);
        let total_pages = pages.len();

        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(index, text)| {
                TextUnit::new(
                    text,
                    TextUnit::page_metadata(&file_path, index as u32, total_pages),
                )
            })
            .collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoaderKind {
    #[default]
    Lopdf,
    PdfExtract,
}

impl LoaderKind {
    pub fn loader_for(self, path: &Path) -> Box<dyn DocumentLoader + Send> {
        match self {
            Self::Lopdf => Box::new(LopdfLoader::new(path)),
            Self::PdfExtract => Box::new(PdfExtractLoader::new(path)),
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
