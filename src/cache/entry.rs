//! Cache entry definitions: file identity fingerprints and cached outcomes.

use std::fmt;
use std::path::Path;
use std::time::UNIX_EPOCH;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Content-identity fingerprint of a source file.
///
/// Derived from the absolute path, byte size, and modification time, so a
/// file that changes on disk produces a different identity and misses the
/// cache instead of returning a stale date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentity(String);

impl FileIdentity {
    /// Compute the identity fingerprint for a file.
    ///
    /// If the file's metadata cannot be read, falls back to hashing the
    /// path alone. A path-only entry misses more often but never returns a
    /// date for a different file, except in the narrow case where stat
    /// fails transiently while the content changes between runs, a known
    /// weak guarantee we accept.
    #[must_use]
    pub fn of(path: &Path) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        let key = match std::fs::metadata(path) {
            Ok(meta) => {
                let mtime_nanos = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_nanos())
                    .unwrap_or(0);
                format!("{}|{}|{}", absolute.display(), meta.len(), mtime_nanos)
            }
            Err(e) => {
                log::debug!(
                    "Cannot stat {}, using path-only identity: {}",
                    path.display(),
                    e
                );
                format!("{}", absolute.display())
            }
        };

        Self(blake3::hash(key.as_bytes()).to_hex().to_string())
    }

    /// Construct an identity from a previously stored hex string.
    #[must_use]
    pub fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    /// The fingerprint as a hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a past extraction attempt.
///
/// `NotFound` records that extraction ran and produced nothing, which is
/// distinct from a cache miss: it stops the pipeline from re-running OCR on
/// an unchanged unreadable file every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CachedDate {
    /// A payment date was extracted.
    Found(NaiveDate),
    /// Extraction was attempted and no date was found.
    NotFound,
}

impl CachedDate {
    /// The extracted date, if one was found.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Found(date) => Some(*date),
            Self::NotFound => None,
        }
    }
}
