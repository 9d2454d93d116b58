//! Payment-date extraction from PDF payslips.
//!
//! Extraction is text-layer-first with an OCR fallback: each page's
//! embedded text is read with `pdf-extract`, and any page with no usable
//! text layer is rasterized and run through Tesseract. The combined text is
//! then matched against an ordered list of label-anchored date patterns
//! ("Payment Date:", "Pay Date:", ... down to a bare "Date:" catch-all) and
//! the first capture that parses day-first wins.
//!
//! # Architecture
//!
//! * [`pattern`]: the ordered label patterns.
//! * [`date`]: day-first fuzzy date parsing.
//! * [`ocr`]: rasterization + Tesseract via external poppler/tesseract
//!   binaries.

pub mod date;
pub mod ocr;
pub mod pattern;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

pub use date::parse_fuzzy_dayfirst;
pub use ocr::{OcrEngine, OcrError};
pub use pattern::find_labeled_date;

/// Errors that can occur while extracting a date from one file.
///
/// These are always per-file: the pipeline logs them and moves on.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file could not be read from disk.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The PDF text layer could not be parsed.
    #[error("Failed to extract text from {path}: {message}")]
    TextLayer {
        /// Path to the PDF file
        path: PathBuf,
        /// Error message from the PDF parser
        message: String,
    },

    /// OCR of a rasterized page failed.
    #[error("OCR failed for {path} page {page}: {source}")]
    Ocr {
        /// Path to the PDF file
        path: PathBuf,
        /// 1-based page number
        page: usize,
        /// The underlying OCR error
        #[source]
        source: OcrError,
    },
}

/// Extracts a best-guess payment date from a document.
///
/// This is the seam between the pipeline and the PDF machinery; tests
/// substitute counting or scripted implementations.
pub trait DateExtractor: Send + Sync {
    /// Extract the payment date from the file at `path`.
    ///
    /// Returns `Ok(None)` when no pattern matched or nothing parsed;
    /// errors are per-file and recoverable by the caller.
    fn extract(&self, path: &Path) -> Result<Option<NaiveDate>, ExtractError>;
}

/// PDF payment-date extractor: text layer first, OCR fallback per page.
#[derive(Debug)]
pub struct PdfDateExtractor {
    ocr: OcrEngine,
}

impl PdfDateExtractor {
    /// Create an extractor with the default OCR engine configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ocr: OcrEngine::default(),
        }
    }

    /// Use a custom OCR engine (language, DPI).
    #[must_use]
    pub fn with_ocr(mut self, ocr: OcrEngine) -> Self {
        self.ocr = ocr;
        self
    }

    /// Read the full text of a document, page by page, OCRing pages that
    /// have no extractable text layer.
    fn read_full_text(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = fs::read(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
            ExtractError::TextLayer {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        let mut full_text = String::new();
        for (index, page_text) in pages.iter().enumerate() {
            if page_text.trim().is_empty() {
                let page = index + 1;
                log::debug!(
                    "{} page {} has no text layer, running OCR",
                    path.display(),
                    page
                );
                let ocr_text =
                    self.ocr
                        .ocr_pdf_page(path, page)
                        .map_err(|source| ExtractError::Ocr {
                            path: path.to_path_buf(),
                            page,
                            source,
                        })?;
                full_text.push_str(&ocr_text);
            } else {
                full_text.push_str(page_text);
            }
            full_text.push('\n');
        }

        Ok(full_text)
    }
}

impl Default for PdfDateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DateExtractor for PdfDateExtractor {
    fn extract(&self, path: &Path) -> Result<Option<NaiveDate>, ExtractError> {
        let text = self.read_full_text(path)?;
        Ok(find_labeled_date(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let extractor = PdfDateExtractor::new();
        let result = extractor.extract(&dir.path().join("missing.pdf"));
        assert!(matches!(result, Err(ExtractError::Io { .. })));
    }

    #[test]
    fn test_garbage_file_is_text_layer_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"not a pdf at all").unwrap();

        let extractor = PdfDateExtractor::new();
        let result = extractor.extract(&path);
        assert!(matches!(result, Err(ExtractError::TextLayer { .. })));
    }

    #[test]
    fn test_extract_error_display_includes_path() {
        let err = ExtractError::TextLayer {
            path: PathBuf::from("/slips/march.pdf"),
            message: "bad xref".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("/slips/march.pdf"));
        assert!(rendered.contains("bad xref"));
    }
}
