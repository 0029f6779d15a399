//! docsearch - find text in PDFs and scanned images.
//!
//! Extracts page text either from a PDF's embedded text layer or by
//! rasterizing pages and running OCR, then runs case-insensitive substring
//! search over it. Exposed as a library, a CLI and an HTTP service.

pub mod cli;
pub mod config;
pub mod ocr;
pub mod paths;
pub mod scan;
pub mod search;
pub mod server;
pub mod service;
pub mod upload;

pub use config::Settings;
pub use ocr::{DocumentKind, ExtractionError, ExtractionMode, PageTexts, TextExtractor};
pub use scan::{BatchScanner, ScanResult, SearchPolicy};
pub use search::{search, MatchRecord, Query};
pub use service::{SearchError, SearchService};
pub use upload::{UploadError, UploadSession};
