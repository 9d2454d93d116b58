//! SQLite-backed date cache store.
//!
//! The mapping lives in memory during a run; the database is only touched
//! at the load/save boundaries. A corrupt or unreadable database never
//! fails a run: load yields an empty mapping and save recreates the file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use rusqlite::Connection;

use super::{CachedDate, FileIdentity};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persistent mapping from file identity to extraction outcome.
///
/// Owned by exactly one pipeline run at a time; there is no internal
/// locking. Mutations happen in memory via [`put`](Self::put) and reach
/// disk only through [`save`](Self::save).
#[derive(Debug)]
pub struct DateCache {
    path: PathBuf,
    entries: HashMap<FileIdentity, CachedDate>,
}

impl DateCache {
    /// Open the cache at the given database path.
    ///
    /// Load failures of any kind (missing file, corrupt database, bad
    /// rows) are logged and produce an empty mapping; no partial state
    /// propagates.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        let entries = match Self::load(path) {
            Ok(entries) => {
                log::debug!(
                    "Loaded {} cached extraction results from {}",
                    entries.len(),
                    path.display()
                );
                entries
            }
            Err(e) => {
                log::warn!(
                    "Could not load date cache from {}, starting empty: {}",
                    path.display(),
                    e
                );
                HashMap::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    /// Create an empty in-memory cache that will persist to `path` on save.
    #[must_use]
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: HashMap::new(),
        }
    }

    fn load(path: &Path) -> Result<HashMap<FileIdentity, CachedDate>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let conn = Connection::open(path)
            .with_context(|| format!("open cache database {}", path.display()))?;

        let mut stmt = conn.prepare("SELECT identity, date FROM extracted_dates")?;
        let rows = stmt.query_map([], |row| {
            let identity: String = row.get(0)?;
            let date: Option<String> = row.get(1)?;
            Ok((identity, date))
        })?;

        let mut entries = HashMap::new();
        for row in rows {
            let (identity, date) = row?;
            let cached = match date {
                Some(raw) => CachedDate::Found(
                    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                        .with_context(|| format!("bad cached date '{}'", raw))?,
                ),
                None => CachedDate::NotFound,
            };
            entries.insert(FileIdentity::from_hex(identity), cached);
        }

        Ok(entries)
    }

    /// Look up the cached outcome for a file identity.
    #[must_use]
    pub fn get(&self, identity: &FileIdentity) -> Option<CachedDate> {
        self.entries.get(identity).copied()
    }

    /// Record an extraction outcome (upsert, in memory only).
    pub fn put(&mut self, identity: FileIdentity, outcome: CachedDate) {
        self.entries.insert(identity, outcome);
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the full mapping to the database in one transaction.
    ///
    /// If the first attempt fails (typically a corrupt database file left
    /// over from an earlier version), the file is removed and written
    /// fresh once. Callers treat any remaining error as non-fatal.
    pub fn save(&self) -> Result<()> {
        match self.write_all() {
            Ok(()) => Ok(()),
            Err(first) => {
                log::warn!(
                    "Rewriting cache database {} after save failure: {}",
                    self.path.display(),
                    first
                );
                let _ = fs::remove_file(&self.path);
                self.write_all()
            }
        }
    }

    fn write_all(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create cache directory {}", parent.display()))?;
        }

        let mut conn = Connection::open(&self.path)
            .with_context(|| format!("open cache database {}", self.path.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS extracted_dates (
                identity TEXT PRIMARY KEY,
                date TEXT
            )",
            [],
        )?;

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM extracted_dates", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO extracted_dates (identity, date) VALUES (?1, ?2)")?;
            for (identity, outcome) in &self.entries {
                let date = outcome.date().map(|d| d.format(DATE_FORMAT).to_string());
                stmt.execute(rusqlite::params![identity.as_str(), date])?;
            }
        }
        tx.commit()?;

        Ok(())
    }
}

/// Default platform-specific location for the cache database.
pub fn default_cache_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "payslipmerge", "payslipmerge")
        .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
    Ok(project_dirs.cache_dir().join("date_cache.sqlite"))
}
