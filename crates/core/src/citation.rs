use crate::error::MetadataError;
use crate::models::{CitationRecord, Metadata, FILE_PATH_KEY, PAGE_KEY};

/// Maps a unit's raw metadata into the citation returned to clients.
///
/// Both `page` and `file_path` are required. A unit without them never
/// came from one of our loaders, so this fails instead of defaulting.
pub fn format_source(metadata: &Metadata) -> Result<CitationRecord, MetadataError> {
    let page = metadata
        .get(PAGE_KEY)
        .ok_or(MetadataError::MissingField(PAGE_KEY))?;
    let page = page.as_u64().ok_or(MetadataError::InvalidField {
        field: PAGE_KEY,
        expected: "a non-negative integer",
    })?;

    let file_path = metadata
        .get(FILE_PATH_KEY)
        .ok_or(MetadataError::MissingField(FILE_PATH_KEY))?;
    let file_path = file_path.as_str().ok_or(MetadataError::InvalidField {
        field: FILE_PATH_KEY,
        expected: "a string",
    })?;

    Ok(CitationRecord {
        source: basename(file_path).to_string(),
        page,
    })
}

/// Final path component, accepting either separator so paths recorded on
/// another platform still cite cleanly.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn metadata(value: Value) -> Metadata {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn formats_basename_and_page() {
        let record = format_source(&metadata(json!({
            "page": 4,
            "file_path": "/a/b/report.pdf"
        })))
        .expect("metadata is complete");

        assert_eq!(
            record,
            CitationRecord {
                source: "report.pdf".to_string(),
                page: 4
            }
        );
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"source": "report.pdf", "page": 4})
        );
    }

    #[test]
    fn missing_page_is_an_error() {
        let error = format_source(&metadata(json!({"file_path": "/a/report.pdf"}))).unwrap_err();
        assert_eq!(error, MetadataError::MissingField("page"));
    }

    #[test]
    fn missing_file_path_is_an_error() {
        let error = format_source(&metadata(json!({"page": 1}))).unwrap_err();
        assert_eq!(error, MetadataError::MissingField("file_path"));
    }

    #[test]
    fn page_must_be_an_integer() {
        let error = format_source(&metadata(json!({
            "page": "four",
            "file_path": "report.pdf"
        })))
        .unwrap_err();
        assert!(matches!(error, MetadataError::InvalidField { field: "page", .. }));
    }

    #[test]
    fn relative_and_windows_paths_reduce_to_file_name() {
        assert_eq!(basename("report.pdf"), "report.pdf");
        assert_eq!(basename("data\\uploaded\\LVMH.pdf"), "LVMH.pdf");
        assert_eq!(basename("./data/uploaded/abc/LVMH.pdf"), "LVMH.pdf");
    }
}
