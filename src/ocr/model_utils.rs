//! Shared utilities for the tool-backed backends.

use super::backend::OcrError;

/// Install hint for pdftoppm.
pub const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";

/// Install hint for pdftotext.
pub const PDFTOTEXT_NOT_FOUND: &str = "pdftotext not found (install poppler-utils)";

/// Install hint for pdfinfo.
pub const PDFINFO_NOT_FOUND: &str = "pdfinfo not found (install poppler-utils)";

/// Install hint for tesseract.
pub const TESSERACT_NOT_FOUND: &str = "tesseract not found (install tesseract-ocr)";

/// External tools the default backends shell out to.
pub const REQUIRED_TOOLS: [&str; 4] = ["pdfinfo", "pdftotext", "pdftoppm", "tesseract"];

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Check if required tools are available.
pub fn check_tools() -> Vec<(String, bool)> {
    REQUIRED_TOOLS
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}

/// Handle command output, extracting stdout on success or mapping the failure.
pub fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    not_found_hint: &str,
    error_prefix: &str,
) -> Result<String, OcrError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::OcrFailed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
            OcrError::BackendNotAvailable(not_found_hint.to_string()),
        ),
        Err(e) => Err(OcrError::Io(e)),
    }
}
