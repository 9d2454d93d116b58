//! OCR fallback using external poppler and Tesseract binaries.
//!
//! Pages without a text layer are rasterized to 300 DPI grayscale PNGs
//! with `pdftoppm` and read with `tesseract`. Both tools come from the
//! system PATH; [`OcrEngine::is_available`] reports whether the fallback
//! can run at all.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use thiserror::Error;

/// Errors from the external OCR toolchain.
#[derive(Debug, Error)]
pub enum OcrError {
    /// A required external tool is not installed.
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    /// The tool ran but reported failure.
    #[error("OCR failed: {0}")]
    Failed(String),

    /// An I/O error occurred while staging images.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rasterize-and-recognize engine for pages with no text layer.
#[derive(Debug, Clone)]
pub struct OcrEngine {
    /// Rasterization resolution in DPI.
    dpi: u32,
    /// Tesseract language setting.
    lang: String,
}

impl Default for OcrEngine {
    fn default() -> Self {
        Self {
            dpi: 300,
            lang: "eng".to_string(),
        }
    }
}

impl OcrEngine {
    /// Create an engine with the default settings (300 DPI, English).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rasterization resolution.
    #[must_use]
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the Tesseract language.
    #[must_use]
    pub fn with_language(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    /// Whether both required tools are present on PATH.
    #[must_use]
    pub fn is_available() -> bool {
        which::which("pdftoppm").is_ok() && which::which("tesseract").is_ok()
    }

    /// OCR a single page of a PDF file.
    ///
    /// Converts the page (1-based) to a grayscale image under a temporary
    /// directory and runs Tesseract on it.
    pub fn ocr_pdf_page(&self, pdf_path: &Path, page: usize) -> Result<String, OcrError> {
        let temp_dir = TempDir::new()?;
        let prefix = temp_dir.path().join("page");

        let page_str = page.to_string();
        let status = Command::new("pdftoppm")
            .args(["-png", "-gray", "-r", &self.dpi.to_string()])
            .args(["-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg(&prefix)
            .status();

        match status {
            Ok(s) if s.success() => {}
            Ok(_) => {
                return Err(OcrError::Failed(format!(
                    "pdftoppm failed to rasterize page {}",
                    page
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::ToolNotFound(
                    "pdftoppm (install poppler-utils)".to_string(),
                ))
            }
            Err(e) => return Err(OcrError::Io(e)),
        }

        let image = find_page_image(temp_dir.path(), page).ok_or_else(|| {
            OcrError::Failed(format!("no image generated for page {}", page))
        })?;

        self.run_tesseract(&image)
    }

    /// Run Tesseract on an image with the default engine and a uniform
    /// block-of-text layout (`--oem 3 --psm 6`), which suits payslips.
    fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.lang, "--oem", "3", "--psm", "6"])
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::Failed(format!("tesseract: {}", stderr)))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::ToolNotFound(
                "tesseract (install tesseract-ocr)".to_string(),
            )),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

/// Locate the image pdftoppm generated for a page.
///
/// pdftoppm pads the page number to the digit width of the document's last
/// page, so `page-3.png`, `page-03.png`, and `page-003.png` are all
/// possible.
fn find_page_image(dir: &Path, page: usize) -> Option<PathBuf> {
    for digits in [1, 2, 3, 4] {
        let candidate = dir.join(format!("page-{:0width$}.png", page, width = digits));
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}
