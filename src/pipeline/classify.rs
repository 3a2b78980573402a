//! Input classification: decide how a document will be analysed.
//!
//! Only the filename suffix is consulted, case-insensitively. Classification
//! happens before any key lookup or network call, so an unsupported upload
//! is rejected without side effects.

use crate::error::ReportError;
use std::path::Path;
use tracing::debug;

/// Processing branch for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `.pdf`: text extraction first, vision as fallback.
    Pdf,
    /// `.jpg`, `.jpeg`, `.png`: straight to vision.
    Image,
    /// Anything else.
    Unsupported,
}

const IMAGE_SUFFIXES: [&str; 3] = [".jpg", ".jpeg", ".png"];

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            DocumentKind::Pdf
        } else if IMAGE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            DocumentKind::Image
        } else {
            DocumentKind::Unsupported
        }
    }
}

/// One uploaded document. Lives for a single request and is never persisted.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let kind = DocumentKind::from_filename(&filename);
        debug!("Classified '{}' as {:?} ({} bytes)", filename, kind, bytes.len());
        Self {
            filename,
            kind,
            bytes,
        }
    }

    /// Read a local file; the file name becomes the document name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ReportError::InvalidUpload {
                reason: format!("cannot read '{}': {}", path.display(), e),
            })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, bytes))
    }

    /// Fail with [`ReportError::UnsupportedFileType`] unless supported.
    pub fn ensure_supported(&self) -> Result<DocumentKind, ReportError> {
        match self.kind {
            DocumentKind::Unsupported => Err(ReportError::UnsupportedFileType {
                filename: self.filename.clone(),
            }),
            kind => Ok(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filename() {
        assert_eq!(DocumentKind::from_filename("report.pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("REPORT.PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("car.JPG"), DocumentKind::Image);
        assert_eq!(DocumentKind::from_filename("car.jpeg"), DocumentKind::Image);
        assert_eq!(DocumentKind::from_filename("scan.Png"), DocumentKind::Image);
        assert_eq!(DocumentKind::from_filename("notes.txt"), DocumentKind::Unsupported);
        assert_eq!(DocumentKind::from_filename("pdf"), DocumentKind::Unsupported);
        assert_eq!(DocumentKind::from_filename("archive.pdf.zip"), DocumentKind::Unsupported);
        assert_eq!(DocumentKind::from_filename(""), DocumentKind::Unsupported);
    }

    #[test]
    fn unsupported_upload_is_rejected() {
        let doc = UploadedDocument::new("invoice.docx", b"PK".to_vec());
        let err = doc.ensure_supported().unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedFileType { ref filename } if filename == "invoice.docx"));
    }

    #[tokio::test]
    async fn from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Scan.PNG");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let doc = UploadedDocument::from_path(&path).await.unwrap();
        assert_eq!(doc.filename, "Scan.PNG");
        assert_eq!(doc.kind, DocumentKind::Image);
        assert_eq!(doc.bytes, b"\x89PNG");
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = UploadedDocument::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidUpload { .. }));
    }
}
