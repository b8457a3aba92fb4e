//! PDF text extraction.

use std::path::Path;

use crate::types::IngestError;

/// Extracts the text content of a PDF file.
///
/// Lines are trimmed and empty lines dropped; a PDF that yields no text at
/// all (scanned or image-only) counts as an extraction failure rather than an
/// empty document.
///
/// Blocking: callers on the async runtime go through `spawn_blocking`.
pub(crate) fn extract_pdf_text(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(|err| IngestError::Extraction {
        path: path.to_path_buf(),
        reason: format!("read failed: {err}"),
    })?;

    let text =
        pdf_extract::extract_text_from_mem(&bytes).map_err(|err| IngestError::Extraction {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

    let cleaned = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.is_empty() {
        return Err(IngestError::Extraction {
            path: path.to_path_buf(),
            reason: "no extractable text (scanned or image-based PDF)".to_string(),
        });
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_as_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();

        let err = extract_pdf_text(&path).unwrap_err();
        assert!(matches!(err, IngestError::Extraction { .. }));
    }

    #[test]
    fn missing_file_fails_as_extraction_error() {
        let err = extract_pdf_text(Path::new("/nonexistent/doc.pdf")).unwrap_err();
        assert!(matches!(err, IngestError::Extraction { .. }));
    }
}
