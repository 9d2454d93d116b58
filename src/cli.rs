//! Command-line interface definitions for payslipmerge.
//!
//! A single command defined with the clap derive API: point it at a
//! directory of payslip PDFs and it produces one merged, date-sorted PDF.
//!
//! # Example
//!
//! ```bash
//! # Merge every payslip under ~/payslips into the default output
//! payslipmerge ~/payslips
//!
//! # Explicit output path, one payslip per page
//! payslipmerge ~/payslips -o ~/merged.pdf --split-pages
//!
//! # Machine-readable summary for scripting
//! payslipmerge ~/payslips --json
//!
//! # Verbose mode for debugging
//! payslipmerge -v ~/payslips
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Merge payslip PDFs into a single date-sorted document.
///
/// Each PDF's payment date is extracted from its text layer (falling back
/// to OCR via pdftoppm and tesseract), duplicates are dropped, and the
/// remainder is merged in ascending date order.
#[derive(Debug, Parser)]
#[command(name = "payslipmerge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing the payslip PDF files
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Path of the merged output PDF
    ///
    /// Defaults to <INPUT_DIR>/output/arranged_payslips.pdf
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Treat each page of a multi-page PDF as a separate payslip
    #[arg(long)]
    pub split_pages: bool,

    /// Path to the extracted-date cache database
    ///
    /// If not specified, a default platform-specific path is used.
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Disable the extracted-date cache
    #[arg(long, conflicts_with = "cache")]
    pub no_cache: bool,

    /// Clear the extracted-date cache before processing
    #[arg(long)]
    pub clear_cache: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Print fatal errors as structured JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_basic() {
        let cli = Cli::try_parse_from(["payslipmerge", "/some/dir"]).unwrap();
        assert_eq!(cli.input_dir, PathBuf::from("/some/dir"));
        assert_eq!(cli.output, None);
        assert!(!cli.split_pages);
        assert!(!cli.no_cache);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "payslipmerge",
            "/in",
            "-o",
            "/out/merged.pdf",
            "--split-pages",
            "--clear-cache",
            "--json",
            "--json-errors",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.output, Some(PathBuf::from("/out/merged.pdf")));
        assert!(cli.split_pages);
        assert!(cli.clear_cache);
        assert!(cli.json);
        assert!(cli.json_errors);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_missing_input_dir() {
        let result = Cli::try_parse_from(["payslipmerge"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["payslipmerge", "-v", "-q", "/dir"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_no_cache_conflicts_with_cache_path() {
        let result =
            Cli::try_parse_from(["payslipmerge", "/dir", "--no-cache", "--cache", "/tmp/c.db"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["payslipmerge", "/dir", "--cache", "/tmp/c.db"]).unwrap();
        assert_eq!(cli.cache, Some(PathBuf::from("/tmp/c.db")));
    }

    #[test]
    fn test_cli_version_flag() {
        // clap exits early on --version, which try_parse_from reports as Err
        let result = Cli::try_parse_from(["payslipmerge", "--version"]);
        assert!(result.is_err());
    }
}
