//! Folder scanning and the persisted scan cache.
//!
//! - [`FolderScanner`] walks configured roots and updates a [`LineageCache`]
//! - [`LineageCache`] is the persisted, per-root, mtime-keyed record store
//! - [`Catalog`] is the merged read-only view handed to the matcher
//!
//! The scanner mutates only the cache passed to it. Persisting the cache is
//! up to the caller ([`LineageCache::save`]).

mod cache;
mod catalog;
mod scanner;

pub use cache::{CacheError, CacheResult, FolderCache, LineageCache};
pub use catalog::Catalog;
pub use scanner::{FolderScanner, ScanOptions, ScanReport, SkippedRoot};
