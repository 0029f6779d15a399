//! Backend abstraction for the external text tools.
//!
//! Two seams sit between the extractor and the outside world:
//! - [`PdfBackend`]: opening a PDF, counting pages, reading the native text
//!   layer and rasterizing a page to an image file
//! - [`OcrBackend`]: recognizing text in an image file
//!
//! Production implementations shell out to Poppler and Tesseract; tests plug
//! in in-process fakes.

use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

/// Errors from PDF and OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of OCR processing.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Recognized text.
    pub text: String,
    /// Name of the backend that produced this result.
    pub backend: &'static str,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for OCR backends.
pub trait OcrBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Check if this backend is available (dependencies installed).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Core OCR: extract text from an image file.
    ///
    /// Unreadable content yields empty or garbled text, not an error. Errors
    /// are reserved for the engine itself failing to run.
    fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError>;

    /// Run OCR on an image file, returning a timed result.
    fn ocr_image(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let text = self.run_ocr(image_path)?;
        Ok(OcrResult {
            text,
            backend: self.name(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Trait for PDF backends.
///
/// Page numbers are 1-based throughout.
pub trait PdfBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Check if this backend is available (dependencies installed).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Open the document and return its page count.
    ///
    /// Fails on corrupt or unreadable files.
    fn page_count(&self, pdf_path: &Path) -> Result<u32, OcrError>;

    /// Embedded text of one page, empty if the page has none.
    fn native_text(&self, pdf_path: &Path, page: u32) -> Result<String, OcrError>;

    /// Render one page into `output_dir` and return the image path.
    fn rasterize_page(
        &self,
        pdf_path: &Path,
        page: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, OcrError>;
}
