use crate::citation::basename;
use crate::IngestError;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Case-sensitive `.pdf` suffix check applied to uploaded file names.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.ends_with(".pdf")
}

/// Keeps uploaded files on disk, one directory per content digest.
///
/// Files land at `<root>/<sha256>/<file name>`: the same bytes always map to
/// the same path and two different files sharing a name never collide,
/// while the stored basename still matches what the client sent.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, IngestError> {
        let name = safe_file_name(filename)?;
        let digest = format!("{:x}", Sha256::digest(bytes));

        let directory = self.root.join(digest);
        tokio::fs::create_dir_all(&directory).await?;
        let path = directory.join(name);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "stored upload");
        Ok(path)
    }
}

fn safe_file_name(filename: &str) -> Result<&str, IngestError> {
    let name = basename(filename.trim());
    if name.is_empty() || name == "." || name == ".." {
        return Err(IngestError::MissingFileName(filename.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn suffix_check_is_case_sensitive() {
        assert!(is_pdf_filename("report.pdf"));
        assert!(!is_pdf_filename("report.PDF"));
        assert!(!is_pdf_filename("report.txt"));
        assert!(!is_pdf_filename("report.pdf.txt"));
    }

    #[tokio::test]
    async fn same_name_different_content_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let first = store.save("report.pdf", b"first").await.unwrap();
        let second = store.save("report.pdf", b"second").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
        assert_eq!(first.file_name(), second.file_name());
    }

    #[tokio::test]
    async fn identical_upload_reuses_the_path() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let first = store.save("report.pdf", b"same").await.unwrap();
        let second = store.save("report.pdf", b"same").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn directory_components_are_stripped() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let path = store.save("../../etc/report.pdf", b"x").await.unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.file_name().and_then(|name| name.to_str()), Some("report.pdf"));
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let dir = tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        assert!(matches!(
            store.save("uploads/", b"x").await,
            Err(IngestError::MissingFileName(_))
        ));
    }
}
