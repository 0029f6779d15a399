//! Batch search across a directory of documents.
//!
//! Files are processed in directory-listing order, one page at a time, so a
//! termination policy can stop before paying for OCR on pages it no longer
//! needs. A failure on one file is recorded on that file's result and the
//! scan moves on.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ocr::{DocumentKind, ExtractionError, ExtractionMode, TextExtractor};
use crate::search::{MatchRecord, Query};

/// When a batch scan stops looking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPolicy {
    /// Every page of every file.
    #[default]
    AllMatches,
    /// Stop the whole scan at the first page with a match.
    FirstMatchAnyPdf,
    /// Stop each file at its first match, then continue with the next file.
    FirstMatchPerPdf,
}

impl SearchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllMatches => "all_matches",
            Self::FirstMatchAnyPdf => "first_match_any_pdf",
            Self::FirstMatchPerPdf => "first_match_per_pdf",
        }
    }
}

impl fmt::Display for SearchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "all_matches" | "all" => Ok(Self::AllMatches),
            "first_match_any_pdf" | "first_any" => Ok(Self::FirstMatchAnyPdf),
            "first_match_per_pdf" | "first_per_file" => Ok(Self::FirstMatchPerPdf),
            other => Err(format!(
                "unknown search mode '{}' (expected all_matches, first_match_any_pdf or first_match_per_pdf)",
                other
            )),
        }
    }
}

/// Outcome of scanning one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub filename: String,
    pub matches: Vec<MatchRecord>,
    pub ocr_mode: ExtractionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanResult {
    fn failed(filename: String, ocr_mode: ExtractionMode, error: &ExtractionError) -> Self {
        Self {
            filename,
            matches: Vec::new(),
            ocr_mode,
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Matches collected from one file, and whether the policy ended the scan.
struct FileScan {
    matches: Vec<MatchRecord>,
    stop_scan: bool,
}

/// Runs extraction and search over every supported file in a directory.
#[derive(Debug, Clone, Default)]
pub struct BatchScanner {
    extractor: TextExtractor,
}

impl BatchScanner {
    pub fn new(extractor: TextExtractor) -> Self {
        Self { extractor }
    }

    /// Scan `dir` for `query`.
    ///
    /// Only fails if the directory itself cannot be listed. A file appears in
    /// the output only if it produced a match or an error.
    pub fn scan_directory(
        &self,
        dir: &Path,
        query: &str,
        policy: SearchPolicy,
        mode: ExtractionMode,
    ) -> std::io::Result<Vec<ScanResult>> {
        self.scan_directory_with(dir, query, policy, mode, |_| {})
    }

    /// Like [`scan_directory`](Self::scan_directory), calling `on_file` before
    /// each supported file is processed.
    pub fn scan_directory_with<F>(
        &self,
        dir: &Path,
        query: &str,
        policy: SearchPolicy,
        mode: ExtractionMode,
        on_file: F,
    ) -> std::io::Result<Vec<ScanResult>>
    where
        F: FnMut(&Path),
    {
        self.scan_entries(dir, None, query, policy, mode, on_file)
    }

    /// Like [`scan_directory_with`](Self::scan_directory_with), skipping any
    /// entry whose canonical path is not under `root`.
    ///
    /// `root` must already be canonical.
    pub fn scan_directory_within<F>(
        &self,
        dir: &Path,
        root: &Path,
        query: &str,
        policy: SearchPolicy,
        mode: ExtractionMode,
        on_file: F,
    ) -> std::io::Result<Vec<ScanResult>>
    where
        F: FnMut(&Path),
    {
        self.scan_entries(dir, Some(root), query, policy, mode, on_file)
    }

    fn scan_entries<F>(
        &self,
        dir: &Path,
        root: Option<&Path>,
        query: &str,
        policy: SearchPolicy,
        mode: ExtractionMode,
        mut on_file: F,
    ) -> std::io::Result<Vec<ScanResult>>
    where
        F: FnMut(&Path),
    {
        let query = Query::new(query);
        if query.is_empty() {
            tracing::debug!("Empty query, nothing to scan in {}", dir.display());
            return Ok(Vec::new());
        }

        let mut results = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            let Some(kind) = DocumentKind::from_path(&path) else {
                continue;
            };
            if !path.is_file() {
                continue;
            }
            if let Some(root) = root {
                if !entry_within(&path, root) {
                    tracing::debug!("Skipping {}: resolves outside {}", path.display(), root.display());
                    continue;
                }
            }

            let filename = entry.file_name().to_string_lossy().into_owned();
            on_file(&path);
            tracing::debug!("Checking {}", path.display());

            match self.scan_file(&path, kind, &query, policy, mode) {
                Ok(scan) => {
                    let result = ScanResult {
                        filename,
                        matches: scan.matches,
                        ocr_mode: mode,
                        error: None,
                    };
                    if scan.stop_scan {
                        tracing::info!(
                            "First match found in {}, stopping scan of {}",
                            result.filename,
                            dir.display()
                        );
                        return Ok(vec![result]);
                    }
                    if !result.matches.is_empty() {
                        results.push(result);
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to scan {}: {}", path.display(), e);
                    results.push(ScanResult::failed(filename, mode, &e));
                }
            }
        }

        tracing::info!(
            "Scanned {} for {:?}: {} file(s) with results",
            dir.display(),
            query.as_str(),
            results.len()
        );
        Ok(results)
    }

    fn scan_file(
        &self,
        path: &Path,
        kind: DocumentKind,
        query: &Query,
        policy: SearchPolicy,
        mode: ExtractionMode,
    ) -> Result<FileScan, ExtractionError> {
        let page_count = self.extractor.page_count(path, kind)?;
        let mut matches = Vec::new();

        for page in 1..=page_count {
            let text = self.extractor.extract_page(path, kind, page, mode)?;
            let found = query.find_in_page(page, &text);
            if found.is_empty() {
                continue;
            }

            match policy {
                SearchPolicy::AllMatches => matches.extend(found),
                SearchPolicy::FirstMatchAnyPdf => {
                    matches.extend(found);
                    return Ok(FileScan {
                        matches,
                        stop_scan: true,
                    });
                }
                SearchPolicy::FirstMatchPerPdf => {
                    matches.extend(found.into_iter().take(1));
                    break;
                }
            }
        }

        Ok(FileScan {
            matches,
            stop_scan: false,
        })
    }
}

/// Whether `path`, with symlinks resolved, sits under the canonical `root`.
fn entry_within(path: &Path, root: &Path) -> bool {
    match path.canonicalize() {
        Ok(resolved) => resolved.starts_with(root),
        Err(_) => false,
    }
}
