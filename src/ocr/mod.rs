//! OCR and text extraction module.
//!
//! Extracts page-indexed text from documents using:
//! - pdfinfo / pdftotext (Poppler) for opening PDFs and reading the native text layer
//! - pdftoppm (Poppler) for rasterizing PDF pages
//! - Tesseract OCR for rasterized pages and image files
//!
//! The tools sit behind the [`PdfBackend`] and [`OcrBackend`] traits so the
//! extractor can run against other engines.

mod backend;
mod extractor;
mod model_utils;
mod pdf_utils;
mod tesseract;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{OcrBackend, OcrError, OcrResult, PdfBackend};
pub use extractor::{
    DocumentKind, ExtractionError, ExtractionMode, PageTexts, TextExtractor, IMAGE_EXTENSIONS,
};
pub use model_utils::{check_binary, check_tools};
pub use pdf_utils::{find_page_image, PopplerBackend, DEFAULT_DPI};
pub use tesseract::TesseractBackend;
