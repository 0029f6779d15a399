//! Page-indexed text extraction from PDFs and images.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use thiserror::Error;

use super::backend::{OcrBackend, OcrError, PdfBackend};
use super::model_utils;
use super::pdf_utils::PopplerBackend;
use super::tesseract::TesseractBackend;

/// Extracted text keyed by 1-based page number.
pub type PageTexts = BTreeMap<u32, String>;

/// Image extensions handled by running OCR on the pixels directly.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tiff", "bmp", "webp"];

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to open {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: OcrError,
    },

    #[error("Invalid page number: {0}")]
    InvalidPage(u32),

    #[error(transparent)]
    Backend(#[from] OcrError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Kind of document, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    /// Single-page raster image.
    Image,
}

impl DocumentKind {
    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if ext == "pdf" {
            Some(Self::Pdf)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else {
            None
        }
    }

    /// Classify a path, failing with `UnsupportedFormat` for anything else.
    pub fn detect(path: &Path) -> Result<Self, ExtractionError> {
        Self::from_path(path).ok_or_else(|| {
            ExtractionError::UnsupportedFormat(
                path.extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| path.display().to_string()),
            )
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
        }
    }
}

/// How text is pulled out of a PDF. Images always go through OCR.
///
/// The wire names follow the upload form: `scanned` for OCR and `text` for
/// the native text layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtractionMode {
    /// Read the text layer embedded by the PDF producer.
    #[serde(rename = "text", alias = "native")]
    Native,
    /// Rasterize every page and run OCR.
    #[default]
    #[serde(rename = "scanned", alias = "ocr")]
    Ocr,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "text",
            Self::Ocr => "scanned",
        }
    }

    pub fn is_ocr(&self) -> bool {
        matches!(self, Self::Ocr)
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scanned" | "ocr" => Ok(Self::Ocr),
            "text" | "native" => Ok(Self::Native),
            other => Err(format!(
                "unknown OCR mode '{}' (expected 'scanned' or 'text')",
                other
            )),
        }
    }
}

/// Text extractor over pluggable PDF and OCR backends.
///
/// Every call opens the document afresh; nothing is cached between calls.
#[derive(Clone)]
pub struct TextExtractor {
    pdf: Arc<dyn PdfBackend>,
    ocr: Arc<dyn OcrBackend>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::with_backends(
            Arc::new(PopplerBackend::default()),
            Arc::new(TesseractBackend::default()),
        )
    }
}

impl fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextExtractor")
            .field("pdf", &self.pdf.name())
            .field("ocr", &self.ocr.name())
            .finish()
    }
}

impl TextExtractor {
    /// Create an extractor using poppler-utils and Tesseract.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor over explicit backends.
    pub fn with_backends(pdf: Arc<dyn PdfBackend>, ocr: Arc<dyn OcrBackend>) -> Self {
        Self { pdf, ocr }
    }

    /// Number of pages in a document. Images are always one page.
    pub fn page_count(&self, path: &Path, kind: DocumentKind) -> Result<u32, ExtractionError> {
        match kind {
            DocumentKind::Image => Ok(1),
            DocumentKind::Pdf => self.open_pdf(path),
        }
    }

    /// Extract the text of a single 1-based page.
    pub fn extract_page(
        &self,
        path: &Path,
        kind: DocumentKind,
        page: u32,
        mode: ExtractionMode,
    ) -> Result<String, ExtractionError> {
        if page == 0 {
            return Err(ExtractionError::InvalidPage(page));
        }

        match kind {
            DocumentKind::Image => {
                if page != 1 {
                    return Err(ExtractionError::InvalidPage(page));
                }
                self.ocr_file(path)
            }
            DocumentKind::Pdf => match mode {
                ExtractionMode::Native => Ok(self.pdf.native_text(path, page)?),
                ExtractionMode::Ocr => self.ocr_pdf_page(path, page),
            },
        }
    }

    /// Extract every page of a document.
    pub fn extract(
        &self,
        path: &Path,
        mode: ExtractionMode,
    ) -> Result<PageTexts, ExtractionError> {
        let kind = DocumentKind::detect(path)?;
        let page_count = self.page_count(path, kind)?;

        tracing::debug!(
            "Extracting {} page(s) from {} ({}, mode={})",
            page_count,
            path.display(),
            kind.as_str(),
            mode
        );

        let mut pages = PageTexts::new();
        for page in 1..=page_count {
            let text = self.extract_page(path, kind, page, mode)?;
            pages.insert(page, text);
        }
        Ok(pages)
    }

    /// Check whether a PDF has no usable native text on any page.
    ///
    /// True only if every page's text layer is empty or whitespace. Images have
    /// no text layer at all, so they always need OCR.
    pub fn needs_ocr(&self, path: &Path) -> Result<bool, ExtractionError> {
        match DocumentKind::detect(path)? {
            DocumentKind::Image => Ok(true),
            DocumentKind::Pdf => {
                let page_count = self.open_pdf(path)?;
                for page in 1..=page_count {
                    if !self.pdf.native_text(path, page)?.trim().is_empty() {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Check if required tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        model_utils::check_tools()
    }

    fn open_pdf(&self, path: &Path) -> Result<u32, ExtractionError> {
        self.pdf
            .page_count(path)
            .map_err(|source| ExtractionError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })
    }

    fn ocr_pdf_page(&self, path: &Path, page: u32) -> Result<String, ExtractionError> {
        let temp_dir = TempDir::new()?;
        let image_path = self.pdf.rasterize_page(path, page, temp_dir.path())?;
        self.ocr_file(&image_path)
    }

    fn ocr_file(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let result = self.ocr.ocr_image(image_path)?;
        tracing::debug!(
            "{} recognized {} chars from {} in {}ms",
            result.backend,
            result.text.len(),
            image_path.display(),
            result.processing_time_ms
        );
        Ok(result.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::testing::{fake_extractor, write_fake_pdf};
    use tempfile::TempDir;

    #[test]
    fn test_document_kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a/b.pdf")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(Path::new("b.PDF")), Some(DocumentKind::Pdf));
        for ext in IMAGE_EXTENSIONS {
            let name = format!("scan.{}", ext.to_uppercase());
            assert_eq!(DocumentKind::from_path(Path::new(&name)), Some(DocumentKind::Image));
        }
        assert_eq!(DocumentKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(DocumentKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_detect_unsupported_names_extension() {
        let err = DocumentKind::detect(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(ref e) if e == ".txt"));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("scanned".parse::<ExtractionMode>().unwrap(), ExtractionMode::Ocr);
        assert_eq!("OCR".parse::<ExtractionMode>().unwrap(), ExtractionMode::Ocr);
        assert_eq!("text".parse::<ExtractionMode>().unwrap(), ExtractionMode::Native);
        assert_eq!("native".parse::<ExtractionMode>().unwrap(), ExtractionMode::Native);
        assert!("fuzzy".parse::<ExtractionMode>().is_err());
        assert_eq!(ExtractionMode::default(), ExtractionMode::Ocr);
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(serde_json::to_string(&ExtractionMode::Ocr).unwrap(), "\"scanned\"");
        assert_eq!(serde_json::to_string(&ExtractionMode::Native).unwrap(), "\"text\"");
        let mode: ExtractionMode = serde_json::from_str("\"native\"").unwrap();
        assert_eq!(mode, ExtractionMode::Native);
    }

    #[test]
    fn test_extract_pdf_native_pages_are_one_based() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("doc.pdf");
        write_fake_pdf(&pdf, &["first page", "second page", ""]);

        let pages = fake_extractor().extract(&pdf, ExtractionMode::Native).unwrap();
        assert_eq!(pages.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(pages[&1], "first page");
        assert_eq!(pages[&2], "second page");
        assert_eq!(pages[&3], "");
    }

    #[test]
    fn test_extract_pdf_ocr_uses_rendered_pages() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("scan.pdf");
        // native layer empty, rendered page carries the text
        write_fake_pdf(&pdf, &["\u{1}Scanned Invoice", "\u{1}Page Two"]);

        let extractor = fake_extractor();
        let native = extractor.extract(&pdf, ExtractionMode::Native).unwrap();
        assert!(native.values().all(|t| t.is_empty()));

        let ocr = extractor.extract(&pdf, ExtractionMode::Ocr).unwrap();
        assert_eq!(ocr[&1], "Scanned Invoice");
        assert_eq!(ocr[&2], "Page Two");
    }

    #[test]
    fn test_extract_image_is_single_page_regardless_of_mode() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("photo.jpg");
        std::fs::write(&img, "Receipt total 42").unwrap();

        let extractor = fake_extractor();
        for mode in [ExtractionMode::Native, ExtractionMode::Ocr] {
            let pages = extractor.extract(&img, mode).unwrap();
            assert_eq!(pages.len(), 1);
            assert_eq!(pages[&1], "Receipt total 42");
        }
    }

    #[test]
    fn test_extract_corrupt_pdf_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("broken.pdf");
        std::fs::write(&pdf, b"garbage").unwrap();

        let err = fake_extractor().extract(&pdf, ExtractionMode::Native).unwrap_err();
        assert!(matches!(err, ExtractionError::OpenFailed { .. }));
        assert!(err.to_string().contains("broken.pdf"));
    }

    #[test]
    fn test_extract_unsupported_before_any_io() {
        // file does not exist; rejection must come from the extension alone
        let err = fake_extractor()
            .extract(Path::new("/nonexistent/notes.txt"), ExtractionMode::Ocr)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_extract_page_zero_rejected() {
        let err = fake_extractor()
            .extract_page(Path::new("x.pdf"), DocumentKind::Pdf, 0, ExtractionMode::Native)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidPage(0)));
    }

    #[test]
    fn test_needs_ocr_only_when_every_page_blank() {
        let dir = TempDir::new().unwrap();
        let scanned = dir.path().join("scanned.pdf");
        write_fake_pdf(&scanned, &["  \n\t", "\u{1}image only"]);
        let mixed = dir.path().join("mixed.pdf");
        write_fake_pdf(&mixed, &["   ", "real text"]);

        let extractor = fake_extractor();
        assert!(extractor.needs_ocr(&scanned).unwrap());
        assert!(!extractor.needs_ocr(&mixed).unwrap());
    }

    #[test]
    fn test_needs_ocr_zero_page_pdf() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.pdf");
        write_fake_pdf(&empty, &[]);
        assert!(fake_extractor().needs_ocr(&empty).unwrap());
    }

    #[test]
    fn test_needs_ocr_image() {
        assert!(fake_extractor().needs_ocr(Path::new("scan.png")).unwrap());
    }
}
