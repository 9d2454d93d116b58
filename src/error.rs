//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the payslipmerge application.
///
/// - 0: Success (merged output written)
/// - 1: General error (unexpected failure, including output write failure)
/// - 2: No payslips (completed normally, nothing to merge)
/// - 3: Partial success (merged, but some files errored or were skipped)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: every discovered payslip made it into the output.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// No payslips: nothing with a resolvable date was found to merge.
    NoPayslips = 2,
    /// Partial success: output written but some files errored or lacked a date.
    PartialSuccess = 3,
    /// Interrupted: run was cancelled by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "PM000",
            Self::GeneralError => "PM001",
            Self::NoPayslips => "PM002",
            Self::PartialSuccess => "PM003",
            Self::Interrupted => "PM130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "PM001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::NoPayslips.as_i32(), 2);
        assert_eq!(ExitCode::PartialSuccess.as_i32(), 3);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_code_prefixes() {
        assert_eq!(ExitCode::Success.code_prefix(), "PM000");
        assert_eq!(ExitCode::Interrupted.code_prefix(), "PM130");
    }

    #[test]
    fn test_structured_error() {
        let err = anyhow::anyhow!("boom");
        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        assert_eq!(structured.code, "PM001");
        assert_eq!(structured.exit_code, 1);
        assert_eq!(structured.message, "boom");
        assert!(!structured.interrupted);
    }

    #[test]
    fn test_structured_error_interrupted() {
        let err = anyhow::anyhow!("cancelled");
        let structured = StructuredError::new(&err, ExitCode::Interrupted);
        assert!(structured.interrupted);
    }
}
