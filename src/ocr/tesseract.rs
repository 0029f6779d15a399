//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction.

use std::path::Path;
use std::process::Command;

use super::backend::{OcrBackend, OcrError};
use super::model_utils::{check_binary, handle_cmd_output, TESSERACT_NOT_FOUND};

/// Tesseract OCR backend.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    language: String,
}

impl TesseractBackend {
    /// Create a new Tesseract backend for English text.
    pub fn new() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }

    /// Set Tesseract language (e.g. "eng", "deu+eng").
    pub fn with_language(mut self, lang: &str) -> Self {
        self.language = lang.to_string();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            "Tesseract is available".to_string()
        } else {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        }
    }

    fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        handle_cmd_output(output, TESSERACT_NOT_FOUND, "tesseract failed")
    }
}
