//! Extraction-date caching.
//!
//! OCR is slow, so the pipeline remembers the extraction outcome for every
//! file it has seen. Entries are keyed by a content-identity fingerprint of
//! the source file and looked up on every run.
//!
//! # Architecture
//!
//! * [`entry`]: The identity fingerprint and cached outcome models.
//! * [`store`]: SQLite-backed persistence with whole-map load/save
//!   boundaries.
//!
//! # Cache Invalidation
//!
//! The identity fingerprint covers:
//! * Absolute file path
//! * File size
//! * Modification time (mtime)
//!
//! If any of these change the fingerprint changes, so the old entry simply
//! stops matching. There is no explicit eviction; staleness is prevented
//! purely by fingerprint mismatch.

pub mod entry;
pub mod store;

pub use entry::{CachedDate, FileIdentity};
pub use store::{default_cache_path, DateCache};
