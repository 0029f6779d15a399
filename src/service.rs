//! Request-level search operations.
//!
//! Wraps extraction, search and batch scanning behind the operations the
//! HTTP server and CLI expose, with caller paths confined to the document
//! root and failures mapped onto [`SearchError`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Settings;
use crate::ocr::{DocumentKind, ExtractionError, ExtractionMode, TextExtractor};
use crate::paths::{self, PathError};
use crate::scan::{BatchScanner, ScanResult, SearchPolicy};
use crate::search::{self, MatchRecord};
use crate::upload::{UploadError, UploadSession};

/// Errors returned by search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidPath(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Error processing document: {0}")]
    ProcessingFailed(String),
}

impl From<PathError> for SearchError {
    fn from(e: PathError) -> Self {
        match e {
            PathError::Traversal(_) | PathError::OutsideRoot(_) => Self::InvalidPath(e.to_string()),
            PathError::NotFound(_) => Self::NotFound(e.to_string()),
            PathError::Io { .. } => Self::ProcessingFailed(e.to_string()),
        }
    }
}

impl From<UploadError> for SearchError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::NotPdf(_) => Self::UnsupportedFormat(e.to_string()),
            UploadError::Io(_) => Self::ProcessingFailed(e.to_string()),
        }
    }
}

/// Result of searching one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSearchResponse {
    pub query: String,
    pub matches: Vec<MatchRecord>,
    pub mode: ExtractionMode,
    pub filename: String,
}

/// Result of searching a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySearchResponse {
    pub dir_path: String,
    pub query: String,
    pub results: Vec<ScanResult>,
}

/// Result of searching an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSearchResponse {
    pub filename: String,
    pub matches: Vec<MatchRecord>,
    pub ocr_used: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedsOcrResponse {
    pub filename: String,
    pub needs_ocr: bool,
}

/// Search operations over a confined document tree.
#[derive(Debug, Clone)]
pub struct SearchService {
    document_root: PathBuf,
    scan_dir: PathBuf,
    extractor: TextExtractor,
    scanner: BatchScanner,
    uploads: UploadSession,
}

impl SearchService {
    pub fn new(
        document_root: PathBuf,
        scan_dir: PathBuf,
        extractor: TextExtractor,
        uploads: UploadSession,
    ) -> Self {
        let scanner = BatchScanner::new(extractor.clone());
        Self {
            document_root,
            scan_dir,
            extractor,
            scanner,
            uploads,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.document_root.clone(),
            settings.scan_dir.clone(),
            settings.text_extractor(),
            settings.upload_session(),
        )
    }

    /// Search a document given by a caller-supplied path under the root.
    pub fn search_document(
        &self,
        user_path: &str,
        query: &str,
        mode: ExtractionMode,
    ) -> Result<DocumentSearchResponse, SearchError> {
        let relative = paths::sanitize_relative(user_path)?;
        require_supported(&relative)?;
        let resolved = paths::resolve_within(&self.document_root, user_path)?;
        self.search_path(&resolved, query, mode)
    }

    /// Search a document at a trusted local path.
    pub fn search_path(
        &self,
        path: &Path,
        query: &str,
        mode: ExtractionMode,
    ) -> Result<DocumentSearchResponse, SearchError> {
        require_supported(path)?;
        if !path.is_file() {
            return Err(SearchError::NotFound(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let matches = self
            .extractor
            .extract(path, mode)
            .map(|pages| search::search(&pages, query))
            .map_err(|e| SearchError::ProcessingFailed(e.to_string()))?;

        tracing::info!(
            "Searched {} for {:?} ({}): {} match(es)",
            path.display(),
            query,
            mode,
            matches.len()
        );

        Ok(DocumentSearchResponse {
            query: query.to_string(),
            matches,
            mode,
            filename: display_name(path),
        })
    }

    /// Search every supported file in a directory under `root/scan_dir`.
    pub fn search_directory(
        &self,
        user_dir: &str,
        query: &str,
        policy: SearchPolicy,
        mode: ExtractionMode,
    ) -> Result<DirectorySearchResponse, SearchError> {
        let relative = paths::sanitize_relative(user_dir)?;
        let scan_dir = paths::sanitize_relative(&self.scan_dir.to_string_lossy())?;
        if !relative.starts_with(&scan_dir) {
            return Err(SearchError::InvalidPath(format!(
                "Invalid folder path '{}': must be under /{}",
                user_dir,
                scan_dir.display()
            )));
        }

        let resolved = paths::resolve_within(&self.document_root, user_dir)?;
        let scan_root = self.document_root.join(&scan_dir);
        paths::ensure_under(&resolved, &scan_root, user_dir)?;
        let scan_root = scan_root.canonicalize().map_err(|e| {
            SearchError::ProcessingFailed(format!("cannot resolve scan directory: {}", e))
        })?;

        if !resolved.is_dir() {
            return Err(SearchError::NotFound(format!(
                "Directory not found: {}",
                user_dir
            )));
        }
        let results = self
            .scanner
            .scan_directory_within(&resolved, &scan_root, query, policy, mode, |_| {})
            .map_err(|e| {
                SearchError::ProcessingFailed(format!("cannot list {}: {}", user_dir, e))
            })?;
        Ok(DirectorySearchResponse {
            dir_path: user_dir.to_string(),
            query: query.to_string(),
            results,
        })
    }

    /// Scan a trusted local directory, calling `on_file` before each file.
    pub fn scan_path<F>(
        &self,
        dir: &Path,
        query: &str,
        policy: SearchPolicy,
        mode: ExtractionMode,
        on_file: F,
    ) -> Result<Vec<ScanResult>, SearchError>
    where
        F: FnMut(&Path),
    {
        if !dir.is_dir() {
            return Err(SearchError::NotFound(format!(
                "Directory not found: {}",
                dir.display()
            )));
        }

        self.scanner
            .scan_directory_with(dir, query, policy, mode, on_file)
            .map_err(|e| {
                SearchError::ProcessingFailed(format!("cannot list {}: {}", dir.display(), e))
            })
    }

    /// Search an uploaded PDF. The staged copy is removed before returning.
    pub fn search_upload(
        &self,
        bytes: &[u8],
        filename: &str,
        query: &str,
        mode: ExtractionMode,
    ) -> Result<UploadSearchResponse, SearchError> {
        let matches = self.uploads.with_uploaded_document(bytes, filename, |path| {
            self.extractor
                .extract(path, mode)
                .map(|pages| search::search(&pages, query))
                .map_err(|e| SearchError::ProcessingFailed(e.to_string()))
        })?;

        tracing::info!(
            "Searched upload '{}' for {:?} ({}): {} match(es)",
            filename,
            query,
            mode,
            matches.len()
        );

        Ok(UploadSearchResponse {
            filename: filename.to_string(),
            matches,
            ocr_used: mode.is_ocr(),
        })
    }

    /// Report whether a document under the root lacks a usable text layer.
    pub fn needs_ocr(&self, user_path: &str) -> Result<NeedsOcrResponse, SearchError> {
        let relative = paths::sanitize_relative(user_path)?;
        require_supported(&relative)?;
        let resolved = paths::resolve_within(&self.document_root, user_path)?;
        self.needs_ocr_path(&resolved)
    }

    /// Report whether a trusted local document lacks a usable text layer.
    pub fn needs_ocr_path(&self, path: &Path) -> Result<NeedsOcrResponse, SearchError> {
        require_supported(path)?;
        if !path.is_file() {
            return Err(SearchError::NotFound(format!(
                "File not found: {}",
                path.display()
            )));
        }

        Ok(NeedsOcrResponse {
            filename: display_name(path),
            needs_ocr: self.extractor.needs_ocr(path)?,
        })
    }
}

fn require_supported(path: &Path) -> Result<DocumentKind, SearchError> {
    DocumentKind::detect(path).map_err(|e| SearchError::UnsupportedFormat(e.to_string()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
