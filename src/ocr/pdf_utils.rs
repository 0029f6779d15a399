//! Poppler-backed PDF access.
//!
//! `pdfinfo` opens the document and reports the page count, `pdftotext` reads
//! the native text layer one page at a time and `pdftoppm` renders a page to
//! PNG for OCR.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::backend::{OcrError, PdfBackend};
use super::model_utils::{
    check_binary, handle_cmd_output, PDFINFO_NOT_FOUND, PDFTOPPM_NOT_FOUND, PDFTOTEXT_NOT_FOUND,
};

/// Default rasterization resolution.
pub const DEFAULT_DPI: u32 = 300;

/// PDF backend built on the poppler-utils command-line tools.
#[derive(Debug, Clone)]
pub struct PopplerBackend {
    dpi: u32,
}

impl PopplerBackend {
    pub fn new() -> Self {
        Self { dpi: DEFAULT_DPI }
    }

    /// Set rasterization DPI for OCR rendering.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }
}

impl Default for PopplerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBackend for PopplerBackend {
    fn name(&self) -> &'static str {
        "poppler"
    }

    fn is_available(&self) -> bool {
        ["pdfinfo", "pdftotext", "pdftoppm"]
            .iter()
            .all(|tool| check_binary(tool))
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            "poppler-utils is available".to_string()
        } else {
            "poppler-utils not installed. Install with: apt install poppler-utils".to_string()
        }
    }

    fn page_count(&self, pdf_path: &Path) -> Result<u32, OcrError> {
        let output = Command::new("pdfinfo").arg(pdf_path).output();
        let stdout = handle_cmd_output(output, PDFINFO_NOT_FOUND, "pdfinfo failed")?;

        parse_page_count(&stdout).ok_or_else(|| {
            OcrError::OcrFailed(format!(
                "pdfinfo reported no page count for {}",
                pdf_path.display()
            ))
        })
    }

    fn native_text(&self, pdf_path: &Path, page: u32) -> Result<String, OcrError> {
        let page_str = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg("-") // Output to stdout
            .output();

        let text = handle_cmd_output(
            output,
            PDFTOTEXT_NOT_FOUND,
            &format!("pdftotext failed on page {}", page),
        )?;

        // pdftotext terminates every page with a form feed
        Ok(text.trim_end_matches('\u{c}').to_string())
    }

    fn rasterize_page(
        &self,
        pdf_path: &Path,
        page: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, OcrError> {
        let page_str = page.to_string();
        let dpi_str = self.dpi.to_string();
        let output_prefix = output_dir.join("page");

        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &dpi_str, "-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg(&output_prefix)
            .status();

        match status {
            Ok(s) if s.success() => find_page_image(output_dir, page).ok_or_else(|| {
                OcrError::OcrFailed(format!("No image generated for page {}", page))
            }),
            Ok(_) => Err(OcrError::OcrFailed(format!(
                "pdftoppm failed to convert page {}",
                page
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable(PDFTOPPM_NOT_FOUND.to_string()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

/// Pull the `Pages:` value out of pdfinfo output.
fn parse_page_count(pdfinfo_output: &str) -> Option<u32> {
    pdfinfo_output
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Find the image file for a specific page number.
///
/// pdftoppm names files like page-1.png, page-01.png or page-00001.png; the
/// padding width follows the document's total page count, so any width is
/// accepted.
pub fn find_page_image(temp_path: &Path, page_num: u32) -> Option<PathBuf> {
    std::fs::read_dir(temp_path)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| page_number_of(path) == Some(page_num))
}

fn page_number_of(path: &Path) -> Option<u32> {
    if path.extension()? != "png" {
        return None;
    }
    let digits = path.file_stem()?.to_str()?.strip_prefix("page-")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_page_count() {
        let output = "Title:          report\nProducer:       test\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(output), Some(12));
    }

    #[test]
    fn test_parse_page_count_missing() {
        assert_eq!(parse_page_count("Title: x\nEncrypted: no\n"), None);
        assert_eq!(parse_page_count("Pages: lots\n"), None);
    }

    #[test]
    fn test_find_page_image_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(find_page_image(temp.path(), 1).is_none());
    }

    #[test]
    fn test_find_page_image_with_2_digit_padding() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page-07.png");
        std::fs::write(&path, b"fake png").unwrap();

        assert_eq!(find_page_image(temp.path(), 7), Some(path));
    }

    #[test]
    fn test_find_page_image_with_3_digit_padding() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page-042.png");
        std::fs::write(&path, b"fake png").unwrap();

        assert_eq!(find_page_image(temp.path(), 42), Some(path));
    }

    #[test]
    fn test_find_page_image_with_wide_padding() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page-00042.png");
        std::fs::write(&path, b"fake png").unwrap();
        std::fs::write(temp.path().join("page-00043.png"), b"other").unwrap();

        assert_eq!(find_page_image(temp.path(), 42), Some(path));
        assert_eq!(find_page_image(temp.path(), 4), None);
    }

    #[test]
    fn test_find_page_image_ignores_other_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("page-7.ppm"), b"x").unwrap();
        std::fs::write(temp.path().join("page-x7.png"), b"x").unwrap();
        std::fs::write(temp.path().join("page-+7.png"), b"x").unwrap();

        assert_eq!(find_page_image(temp.path(), 7), None);
    }

    #[test]
    fn test_dpi_never_zero() {
        assert_eq!(PopplerBackend::new().with_dpi(0).dpi(), 1);
        assert_eq!(PopplerBackend::default().dpi(), DEFAULT_DPI);
    }
}
