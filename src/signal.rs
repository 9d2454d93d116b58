//! Signal handling for cooperative cancellation.
//!
//! Centralized Ctrl+C handling. A shared `AtomicBool` flag signals the
//! pipeline worker to stop between files; nothing is force-terminated and
//! in-flight extraction of the current file always completes.
//!
//! # Exit Codes
//!
//! When a signal is received the cancellation flag is set, a message is
//! printed to stderr, and the application exits with code 130 (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption.
/// Unix convention: 128 + signal number (SIGINT = 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Handle for requesting and observing run cancellation.
///
/// Wraps an `AtomicBool` set when Ctrl+C is received. The flag can be
/// shared with the pipeline worker, which polls it between files.
#[derive(Debug, Clone)]
pub struct CancelHandler {
    flag: Arc<AtomicBool>,
}

impl CancelHandler {
    /// Create a new handler with the flag initially unset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get a clone of the cancellation flag for passing to the worker.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Reset the flag to unset. Useful when reusing a handler in tests.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for CancelHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<CancelHandler> = OnceLock::new();

/// Install a Ctrl+C handler that sets the cancellation flag on interrupt.
///
/// Call once, early in startup, before the pipeline runs. If a handler is
/// already installed (e.g. in tests running in parallel) the existing one
/// is reused, or an unhooked handler is returned, so concurrent callers
/// never fail on signal handler conflicts.
pub fn install_handler() -> Result<CancelHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = CancelHandler::new();
    let flag = handler.get_flag();

    match ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);

        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing current file...");
        let _ = std::io::stderr().flush();

        log::info!("Cancellation signal received");
    }) {
        Ok(_) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(_) => {
            if let Some(handler) = GLOBAL_HANDLER.get() {
                handler.reset();
                Ok(handler.clone())
            } else {
                // A hook is already registered elsewhere. Fall back to an
                // unhooked handler that still works for manual cancel().
                log::debug!("Ctrl+C handler already registered, using unhooked handler");
                let fallback = CancelHandler::new();
                let _ = GLOBAL_HANDLER.set(fallback.clone());
                Ok(fallback)
            }
        }
    }
}

/// Create a handler without installing any signal hooks.
///
/// Useful for testing or when the cancellation flag is managed manually.
#[must_use]
pub fn create_handler() -> CancelHandler {
    CancelHandler::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_handler_new() {
        let handler = CancelHandler::new();
        assert!(!handler.is_cancelled());
    }

    #[test]
    fn test_cancel() {
        let handler = CancelHandler::new();
        handler.cancel();
        assert!(handler.is_cancelled());
    }

    #[test]
    fn test_reset() {
        let handler = CancelHandler::new();
        handler.cancel();
        handler.reset();
        assert!(!handler.is_cancelled());
    }

    #[test]
    fn test_get_flag_shares_state() {
        let handler = CancelHandler::new();
        let flag = handler.get_flag();

        assert!(!flag.load(Ordering::SeqCst));
        handler.cancel();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_flag_modification_reflects_in_handler() {
        let handler = CancelHandler::new();
        let flag = handler.get_flag();

        flag.store(true, Ordering::SeqCst);
        assert!(handler.is_cancelled());
    }

    #[test]
    fn test_clone_shares_flag() {
        let handler = CancelHandler::new();
        let cloned = handler.clone();

        handler.cancel();
        assert!(cloned.is_cancelled());
    }

    #[test]
    fn test_exit_code_interrupted() {
        assert_eq!(EXIT_CODE_INTERRUPTED, 130);
    }

    #[test]
    fn test_cancel_handler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CancelHandler>();
    }
}
