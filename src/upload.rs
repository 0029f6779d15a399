//! Scoped temporary storage for uploaded documents.
//!
//! An upload is written to a uniquely named temporary file, handed to a
//! callback, and removed again however the callback ends.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ocr::DocumentKind;

/// Errors staging an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only PDF files are allowed (got '{0}')")]
    NotPdf(String),

    #[error("Failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Stages uploaded bytes on disk for the duration of one request.
#[derive(Debug, Clone, Default)]
pub struct UploadSession {
    temp_dir: Option<PathBuf>,
}

impl UploadSession {
    /// Stage uploads in the system temporary directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage uploads in `dir` instead of the system temporary directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: Some(dir.into()),
        }
    }

    /// Write `bytes` to a fresh temporary `.pdf` file, run `f` on its path and
    /// delete the file afterwards.
    ///
    /// `filename` is the client-supplied name; anything not ending in `.pdf`
    /// is rejected before a file is created. A failed deletion is logged and
    /// does not change the result of `f`.
    pub fn with_uploaded_document<T, E, F>(
        &self,
        bytes: &[u8],
        filename: &str,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&Path) -> Result<T, E>,
        E: From<UploadError>,
    {
        if DocumentKind::from_path(Path::new(filename)) != Some(DocumentKind::Pdf) {
            return Err(UploadError::NotPdf(filename.to_string()).into());
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(".pdf");
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(UploadError::Io)?;

        // the NamedTempFile removes itself if either write fails
        file.write_all(bytes).map_err(UploadError::Io)?;
        file.flush().map_err(UploadError::Io)?;

        let temp_path = file.into_temp_path();
        tracing::debug!(
            "Staged upload '{}' ({} bytes) at {}",
            filename,
            bytes.len(),
            temp_path.display()
        );

        let result = f(&temp_path);

        let staged = temp_path.to_path_buf();
        if let Err(e) = temp_path.close() {
            tracing::warn!("Failed to clean up temp file {}: {}", staged.display(), e);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_callback_sees_uploaded_bytes() {
        let dir = TempDir::new().unwrap();
        let session = UploadSession::in_dir(dir.path());

        let (seen_path, contents) = session
            .with_uploaded_document(b"%PDF-1.7 body", "report.pdf", |path| {
                Ok::<_, UploadError>((path.to_path_buf(), std::fs::read(path)?))
            })
            .unwrap();

        assert_eq!(contents, b"%PDF-1.7 body");
        assert!(seen_path.starts_with(dir.path()));
        assert_eq!(seen_path.extension().unwrap(), "pdf");
        assert!(!seen_path.exists());
        assert!(dir_is_empty(dir.path()));
    }

    #[test]
    fn test_temp_file_removed_when_callback_fails() {
        let dir = TempDir::new().unwrap();
        let session = UploadSession::in_dir(dir.path());
        let mut seen = None;

        let result: anyhow::Result<()> =
            session.with_uploaded_document(b"data", "scan.PDF", |path| {
                seen = Some(path.to_path_buf());
                anyhow::bail!("extraction blew up")
            });

        assert!(result.is_err());
        assert!(!seen.unwrap().exists());
        assert!(dir_is_empty(dir.path()));
    }

    #[test]
    fn test_non_pdf_rejected_before_staging() {
        let dir = TempDir::new().unwrap();
        let session = UploadSession::in_dir(dir.path());
        let mut called = false;

        let result = session.with_uploaded_document(b"data", "photo.png", |_| {
            called = true;
            Ok::<_, UploadError>(())
        });

        assert!(matches!(result, Err(UploadError::NotPdf(ref name)) if name == "photo.png"));
        assert!(!called);
        assert!(dir_is_empty(dir.path()));
    }

    #[test]
    fn test_unique_names_per_upload() {
        let dir = TempDir::new().unwrap();
        let session = UploadSession::in_dir(dir.path());

        let first = session
            .with_uploaded_document(b"a", "a.pdf", |p| Ok::<_, UploadError>(p.to_path_buf()))
            .unwrap();
        let second = session
            .with_uploaded_document(b"b", "a.pdf", |p| Ok::<_, UploadError>(p.to_path_buf()))
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_missing_staging_dir_is_an_error() {
        let session = UploadSession::in_dir("/nonexistent/docsearch/uploads");
        let result =
            session.with_uploaded_document(b"a", "a.pdf", |_| Ok::<_, UploadError>(()));
        assert!(matches!(result, Err(UploadError::Io(_))));
    }
}
