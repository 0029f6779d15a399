//! In-process backends for tests.
//!
//! A fake PDF is a text file starting with [`FAKE_PDF_HEADER`] whose pages are
//! separated by form feeds. Each page may carry a `\u{1}` separator: text
//! before it is the native layer, text after it is what the rendered page
//! shows. Without the separator both are the same. Fake images are plain text
//! files that "recognize" to their own contents.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::backend::{OcrBackend, OcrError, PdfBackend};
use super::extractor::TextExtractor;

pub const FAKE_PDF_HEADER: &str = "%PDF-FAKE\n";

/// Write a fake PDF with the given page bodies.
pub fn write_fake_pdf(path: &Path, pages: &[&str]) {
    let body = format!("{}{}", FAKE_PDF_HEADER, pages.join("\u{c}"));
    std::fs::write(path, body).unwrap();
}

pub fn fake_extractor() -> TextExtractor {
    TextExtractor::with_backends(Arc::new(FakePdfBackend), Arc::new(FakeOcrBackend))
}

pub struct FakePdfBackend;

impl FakePdfBackend {
    fn pages(path: &Path) -> Result<Vec<String>, OcrError> {
        let content = std::fs::read_to_string(path)?;
        let body = content
            .strip_prefix(FAKE_PDF_HEADER)
            .ok_or_else(|| OcrError::OcrFailed("Syntax Error: Couldn't find trailer dictionary".into()))?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        Ok(body.split('\u{c}').map(str::to_string).collect())
    }

    fn page(path: &Path, page: u32) -> Result<String, OcrError> {
        Self::pages(path)?
            .into_iter()
            .nth(page as usize - 1)
            .ok_or_else(|| OcrError::OcrFailed(format!("page {} out of range", page)))
    }
}

impl PdfBackend for FakePdfBackend {
    fn name(&self) -> &'static str {
        "fake-pdf"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "always available".to_string()
    }

    fn page_count(&self, pdf_path: &Path) -> Result<u32, OcrError> {
        Ok(Self::pages(pdf_path)?.len() as u32)
    }

    fn native_text(&self, pdf_path: &Path, page: u32) -> Result<String, OcrError> {
        let body = Self::page(pdf_path, page)?;
        Ok(body.split('\u{1}').next().unwrap_or_default().to_string())
    }

    fn rasterize_page(
        &self,
        pdf_path: &Path,
        page: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, OcrError> {
        let body = Self::page(pdf_path, page)?;
        let rendered = match body.split_once('\u{1}') {
            Some((_, scanned)) => scanned.to_string(),
            None => body,
        };
        let image = output_dir.join(format!("page-{}.png", page));
        std::fs::write(&image, rendered)?;
        Ok(image)
    }
}

pub struct FakeOcrBackend;

impl OcrBackend for FakeOcrBackend {
    fn name(&self) -> &'static str {
        "fake-ocr"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "always available".to_string()
    }

    fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError> {
        Ok(std::fs::read_to_string(image_path)?)
    }
}
