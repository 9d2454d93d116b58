//! Payslip pipeline orchestration.
//!
//! Runs the full batch over one input directory: enumerate PDFs, resolve a
//! payment date per file (cache first, extractor on miss), drop duplicate
//! dates, sort ascending, and merge the survivors into one output
//! document. Per-file failures never abort the batch; only an output write
//! failure is fatal.
//!
//! The pipeline runs on a single worker and talks to its caller only
//! through the [`ProgressCallback`] and [`LogCallback`] traits plus a
//! polled cancellation flag, so an interactive frontend stays responsive
//! without the pipeline knowing it exists.

pub mod merge;
pub mod split;
#[cfg(test)]
pub(crate) mod testpdf;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::cache::{CachedDate, DateCache, FileIdentity};
use crate::extract::{DateExtractor, PdfDateExtractor};
use crate::report::{LogCallback, LogLevel, ProgressCallback};

pub use merge::{merge_documents, MergeError};
pub use split::{split_to_pages, SplitError};

/// One payslip unit awaiting dedup and sorting.
///
/// Transient: produced per input file (or per page with splitting) and
/// consumed by the same run.
#[derive(Debug, Clone)]
pub struct PayslipCandidate {
    /// Path of the document holding this payslip.
    pub source_path: PathBuf,
    /// The extracted payment date.
    pub extracted_date: NaiveDate,
}

/// Counters and outcome of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Units considered before completion or cancellation.
    pub total: usize,
    /// Units that resolved a payment date (before dedup).
    pub with_date: usize,
    /// Units where no date pattern matched or parsed.
    pub without_date: usize,
    /// Units dropped because an earlier unit had the same date.
    pub duplicates_dropped: usize,
    /// Units that failed with a per-file extraction error.
    pub errors: usize,
    /// Whether the run stopped early on the cancellation flag.
    pub cancelled: bool,
    /// Where the merged output was written, if anything was merged.
    pub output: Option<PathBuf>,
}

/// Errors fatal to a pipeline run.
///
/// Per-file extraction problems are counted and logged, never returned;
/// these variants are the run-level failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input path is not a readable directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Writing the merged output failed.
    #[error(transparent)]
    OutputWrite(#[from] MergeError),
}

/// Configuration for a pipeline run.
#[derive(Default)]
pub struct PipelineConfig {
    /// Treat each page of a multi-page source as an independent payslip.
    pub split_pages: bool,
    /// Date extractor; defaults to the PDF text-layer + OCR extractor.
    pub extractor: Option<Arc<dyn DateExtractor>>,
    /// Optional persistent date cache.
    pub cache: Option<DateCache>,
    /// Optional cancellation flag, polled between units.
    pub cancel_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Optional log callback.
    pub log_callback: Option<Arc<dyn LogCallback>>,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("split_pages", &self.split_pages)
            .field("extractor", &self.extractor.as_ref().map(|_| "<extractor>"))
            .field("cache", &self.cache)
            .field("cancel_flag", &self.cancel_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field(
                "log_callback",
                &self.log_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Enable or disable page splitting.
    #[must_use]
    pub fn with_split_pages(mut self, split: bool) -> Self {
        self.split_pages = split;
        self
    }

    /// Set the date extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn DateExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Set the persistent date cache.
    #[must_use]
    pub fn with_cache(mut self, cache: DateCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the cancellation flag polled between units.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Set the log callback.
    #[must_use]
    pub fn with_log_callback(mut self, callback: Arc<dyn LogCallback>) -> Self {
        self.log_callback = Some(callback);
        self
    }
}

/// A unit of work: one document to resolve a date for.
struct WorkUnit {
    path: PathBuf,
    /// Split page files live in a temp dir whose identities are unstable
    /// by construction, so they bypass the cache.
    cacheable: bool,
}

/// The payslip batch pipeline.
///
/// Owns its cache for the duration of a run; runs are serialized by
/// construction (one `Pipeline`, `run` takes `&mut self`).
pub struct Pipeline {
    config: PipelineConfig,
    extractor: Arc<dyn DateExtractor>,
}

impl Pipeline {
    /// Create a pipeline from a configuration.
    #[must_use]
    pub fn new(mut config: PipelineConfig) -> Self {
        let extractor = config
            .extractor
            .take()
            .unwrap_or_else(|| Arc::new(PdfDateExtractor::new()));
        Self { config, extractor }
    }

    fn is_cancelled(&self) -> bool {
        self.config
            .cancel_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn emit_log(&self, message: &str, level: LogLevel) {
        if let Some(ref callback) = self.config.log_callback {
            callback.on_log(message, level);
        }
    }

    fn emit_progress(&self, done: usize, total: usize) {
        if let Some(ref callback) = self.config.progress_callback {
            let percent = if total == 0 {
                100.0
            } else {
                done as f64 / total as f64 * 100.0
            };
            callback.on_progress(percent);
        }
    }

    /// Run the pipeline over `input_dir`, merging into `output_path`.
    ///
    /// Returns a summary of counts and the output location. Only an
    /// unreadable input directory or a failed output write is an error;
    /// everything per-file is recovered, counted, and logged.
    pub fn run(
        &mut self,
        input_dir: &Path,
        output_path: &Path,
    ) -> Result<RunSummary, PipelineError> {
        if !input_dir.is_dir() {
            return Err(PipelineError::NotADirectory(input_dir.to_path_buf()));
        }

        let mut summary = RunSummary::default();
        let files = enumerate_pdfs(input_dir, output_path);
        log::debug!("Found {} PDF files in {}", files.len(), input_dir.display());

        if files.is_empty() {
            self.emit_log("No PDF files found in the input directory", LogLevel::Warning);
            self.persist_cache();
            return Ok(summary);
        }

        // Optional pre-step: explode multi-page sources into page units.
        // The temp dir lives until after the merge.
        let mut split_dir = None;
        let units = if self.config.split_pages {
            match tempfile::tempdir() {
                Ok(dir) => {
                    let units = self.split_units(&files, dir.path(), &mut summary);
                    split_dir = Some(dir);
                    units
                }
                Err(e) => {
                    self.emit_log(
                        &format!("Cannot create split directory, processing whole files: {}", e),
                        LogLevel::Warning,
                    );
                    files
                        .into_iter()
                        .map(|path| WorkUnit {
                            path,
                            cacheable: true,
                        })
                        .collect()
                }
            }
        } else {
            files
                .into_iter()
                .map(|path| WorkUnit {
                    path,
                    cacheable: true,
                })
                .collect()
        };

        let candidates = self.resolve_dates(&units, &mut summary);
        let survivors = self.drop_duplicate_dates(candidates, &mut summary);

        if survivors.is_empty() {
            self.emit_log("No valid payslips found to process", LogLevel::Warning);
            self.persist_cache();
            drop(split_dir);
            return Ok(summary);
        }

        let paths: Vec<PathBuf> = survivors
            .iter()
            .map(|candidate| candidate.source_path.clone())
            .collect();
        let merge_result = merge_documents(&paths, output_path);

        // OCR results are worth keeping even when the merge fails
        self.persist_cache();
        drop(split_dir);

        let page_count = merge_result?;
        self.emit_log(
            &format!(
                "Successfully processed {} payslips ({} pages) into {}",
                survivors.len(),
                page_count,
                output_path.display()
            ),
            LogLevel::Success,
        );
        summary.output = Some(output_path.to_path_buf());

        Ok(summary)
    }

    /// Expand multi-page sources into single-page units. Cancellation is
    /// polled between source files, like everywhere else.
    fn split_units(
        &self,
        files: &[PathBuf],
        split_dir: &Path,
        summary: &mut RunSummary,
    ) -> Vec<WorkUnit> {
        let mut units = Vec::new();
        for path in files {
            if self.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            match split_to_pages(path, split_dir) {
                Ok(pages) => {
                    if pages.len() > 1 {
                        self.emit_log(
                            &format!(
                                "Split {} into {} pages",
                                file_name(path),
                                pages.len()
                            ),
                            LogLevel::Info,
                        );
                    }
                    for page_path in pages {
                        let cacheable = &page_path == path;
                        units.push(WorkUnit {
                            path: page_path,
                            cacheable,
                        });
                    }
                }
                Err(e) => {
                    // Fall back to the whole file, as the original batch
                    // would still contain it
                    self.emit_log(
                        &format!("Error splitting {}: {}", file_name(path), e),
                        LogLevel::Warning,
                    );
                    units.push(WorkUnit {
                        path: path.clone(),
                        cacheable: true,
                    });
                }
            }
        }
        units
    }

    /// Resolve a payment date for every unit: cache first, extractor on
    /// miss, explicit not-found marker stored so unreadable files are not
    /// re-attempted every run.
    fn resolve_dates(
        &mut self,
        units: &[WorkUnit],
        summary: &mut RunSummary,
    ) -> Vec<PayslipCandidate> {
        let total = units.len();
        let mut candidates = Vec::new();

        for (index, unit) in units.iter().enumerate() {
            if self.is_cancelled() {
                summary.cancelled = true;
                self.emit_log("Processing cancelled", LogLevel::Warning);
                break;
            }

            summary.total += 1;
            self.emit_log(
                &format!("Processing {}", file_name(&unit.path)),
                LogLevel::Info,
            );

            if let Some(date) = self.resolve_one(unit, summary) {
                summary.with_date += 1;
                candidates.push(PayslipCandidate {
                    source_path: unit.path.clone(),
                    extracted_date: date,
                });
            }

            self.emit_progress(index + 1, total);
        }

        candidates
    }

    fn resolve_one(&mut self, unit: &WorkUnit, summary: &mut RunSummary) -> Option<NaiveDate> {
        let identity = if unit.cacheable && self.config.cache.is_some() {
            Some(FileIdentity::of(&unit.path))
        } else {
            None
        };

        if let (Some(cache), Some(identity)) = (self.config.cache.as_ref(), identity.as_ref()) {
            match cache.get(identity) {
                Some(CachedDate::Found(date)) => {
                    self.emit_log(
                        &format!("Found payment date {} in {} (cached)", date, file_name(&unit.path)),
                        LogLevel::Success,
                    );
                    return Some(date);
                }
                Some(CachedDate::NotFound) => {
                    summary.without_date += 1;
                    self.emit_log(
                        &format!("No payment date found in {} (cached)", file_name(&unit.path)),
                        LogLevel::Warning,
                    );
                    return None;
                }
                None => {}
            }
        }

        match self.extractor.extract(&unit.path) {
            Ok(Some(date)) => {
                if let (Some(cache), Some(identity)) = (self.config.cache.as_mut(), identity) {
                    cache.put(identity, CachedDate::Found(date));
                }
                self.emit_log(
                    &format!("Found payment date {} in {}", date, file_name(&unit.path)),
                    LogLevel::Success,
                );
                Some(date)
            }
            Ok(None) => {
                if let (Some(cache), Some(identity)) = (self.config.cache.as_mut(), identity) {
                    cache.put(identity, CachedDate::NotFound);
                }
                summary.without_date += 1;
                self.emit_log(
                    &format!("No payment date found in {}", file_name(&unit.path)),
                    LogLevel::Warning,
                );
                None
            }
            Err(e) => {
                if let (Some(cache), Some(identity)) = (self.config.cache.as_mut(), identity) {
                    cache.put(identity, CachedDate::NotFound);
                }
                summary.errors += 1;
                self.emit_log(
                    &format!("Error processing {}: {}", unit.path.display(), e),
                    LogLevel::Error,
                );
                None
            }
        }
    }

    /// First-seen-wins duplicate handling, then a stable ascending sort.
    fn drop_duplicate_dates(
        &self,
        candidates: Vec<PayslipCandidate>,
        summary: &mut RunSummary,
    ) -> Vec<PayslipCandidate> {
        let mut survivors: Vec<PayslipCandidate> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match survivors
                .iter()
                .find(|kept| kept.extracted_date == candidate.extracted_date)
            {
                Some(kept) => {
                    summary.duplicates_dropped += 1;
                    self.emit_log(
                        &format!(
                            "Duplicate payment date {}: dropping {} (keeping {})",
                            candidate.extracted_date,
                            file_name(&candidate.source_path),
                            file_name(&kept.source_path)
                        ),
                        LogLevel::Warning,
                    );
                }
                None => survivors.push(candidate),
            }
        }

        // Stable: equal dates cannot occur after dedup, but discovery
        // order still breaks nothing
        survivors.sort_by_key(|candidate| candidate.extracted_date);
        survivors
    }

    fn persist_cache(&self) {
        if let Some(ref cache) = self.config.cache {
            if let Err(e) = cache.save() {
                log::warn!("Failed to persist date cache: {}", e);
            }
        }
    }

    /// Take the cache back out of the pipeline, e.g. to inspect it in
    /// tests after a run.
    #[must_use]
    pub fn into_cache(self) -> Option<DateCache> {
        self.config.cache
    }
}

/// Enumerate PDF files directly under `dir`, sorted by file name.
///
/// Top-level only: subdirectories are not entered. The suffix check is
/// case-insensitive. The configured output path is excluded so a rerun
/// never ingests its own merged output as an input.
fn enumerate_pdfs(dir: &Path, output_path: &Path) -> Vec<PathBuf> {
    let excluded =
        std::path::absolute(output_path).unwrap_or_else(|_| output_path.to_path_buf());
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .filter(|path| {
            std::path::absolute(path)
                .map(|abs| abs != excluded)
                .unwrap_or(true)
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
