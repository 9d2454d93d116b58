//! Optional page splitting.
//!
//! With splitting enabled, a multi-page payslip batch is treated as N
//! independent payslip units: each page of a multi-page source is written
//! out as its own single-page document under a temporary directory.
//! Single-page sources pass through untouched.

use std::path::{Path, PathBuf};

use lopdf::Document;
use thiserror::Error;

/// Errors from the page-splitting step.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The source document failed to load.
    #[error("Failed to load {path}: {source}")]
    Load {
        /// Path to the source PDF
        path: PathBuf,
        /// The underlying PDF error
        #[source]
        source: lopdf::Error,
    },

    /// A single-page document failed to save.
    #[error("Failed to save split page {path}: {source}")]
    Save {
        /// Path of the page being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Split a PDF into single-page documents under `out_dir`.
///
/// Returns the original path unchanged for single-page sources; otherwise
/// one path per page, in page order.
pub fn split_to_pages(path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, SplitError> {
    let source = Document::load(path).map_err(|source| SplitError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let page_count = source.get_pages().len() as u32;
    if page_count <= 1 {
        return Ok(vec![path.to_path_buf()]);
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());

    let mut split_paths = Vec::with_capacity(page_count as usize);
    for page_num in 1..=page_count {
        let mut single = source.clone();
        let others: Vec<u32> = (1..=page_count).filter(|&n| n != page_num).collect();
        single.delete_pages(&others);
        single.prune_objects();

        let out_path = out_dir.join(format!("{}_page_{}.pdf", stem, page_num));
        single.save(&out_path).map_err(|source| SplitError::Save {
            path: out_path.clone(),
            source,
        })?;
        split_paths.push(out_path);
    }

    Ok(split_paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testpdf::build_pdf;
    use tempfile::tempdir;

    #[test]
    fn test_single_page_passes_through() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("one.pdf");
        build_pdf(&source, &["only page"]).unwrap();

        let out = tempdir().unwrap();
        let result = split_to_pages(&source, out.path()).unwrap();
        assert_eq!(result, vec![source]);
    }

    #[test]
    fn test_multi_page_splits_in_order() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("batch.pdf");
        build_pdf(&source, &["first page", "second page", "third page"]).unwrap();

        let out = tempdir().unwrap();
        let result = split_to_pages(&source, out.path()).unwrap();

        assert_eq!(result.len(), 3);
        for (i, page_path) in result.iter().enumerate() {
            assert!(page_path.exists());
            let doc = Document::load(page_path).unwrap();
            assert_eq!(doc.get_pages().len(), 1);
            let text = pdf_extract::extract_text(page_path).unwrap();
            let expected = ["first", "second", "third"][i];
            assert!(
                text.contains(expected),
                "page {} should contain '{}', got: {}",
                i + 1,
                expected,
                text
            );
        }
    }

    #[test]
    fn test_missing_file_fails_to_load() {
        let dir = tempdir().unwrap();
        let out = tempdir().unwrap();
        let result = split_to_pages(&dir.path().join("missing.pdf"), out.path());
        assert!(matches!(result, Err(SplitError::Load { .. })));
    }
}
