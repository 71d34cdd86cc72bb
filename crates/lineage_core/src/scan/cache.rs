//! Persisted per-folder scan cache.
//!
//! One [`FolderCache`] per configured root, keyed by the root's canonical
//! path. Records are keyed by resolved file path and carry the modification
//! time they were taken at, so a rescan only re-extracts changed files.
//!
//! All maps are ordered, so serialising an unchanged cache is byte-stable.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::Catalog;
use crate::config::atomic_write;
use crate::models::{ClipId, ClipRecord, FrameImageRecord};

/// Errors from loading or saving the cache file.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse cache: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cached records of one root folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderCache {
    /// Clip records keyed by resolved path.
    #[serde(default)]
    pub clips: BTreeMap<ClipId, ClipRecord>,
    /// Frame-image records keyed by resolved path.
    #[serde(default)]
    pub frames: BTreeMap<PathBuf, FrameImageRecord>,
}

/// Scan cache for all configured roots.
///
/// Mutated only by the folder scanner; everything downstream works on the
/// merged [`Catalog`] snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineageCache {
    folders: BTreeMap<PathBuf, FolderCache>,
}

impl LineageCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a cache file.
    pub fn load(path: &Path) -> CacheResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load a cache file, starting empty if it is missing or corrupt.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }
        match Self::load(path) {
            Ok(cache) => {
                tracing::info!(
                    "Loaded cache: {} folders, {} clips, {} frame images",
                    cache.folders.len(),
                    cache.clip_count(),
                    cache.frame_count()
                );
                cache
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable cache {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Serialise the cache as pretty JSON.
    pub fn to_json(&self) -> CacheResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save the cache atomically.
    pub fn save(&self, path: &Path) -> CacheResult<()> {
        let json = self.to_json()?;
        atomic_write(path, &json).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Saved cache to {}", path.display());
        Ok(())
    }

    /// Cached records of one root, created empty if absent.
    pub fn folder_entry(&mut self, root: &Path) -> &mut FolderCache {
        self.folders.entry(root.to_path_buf()).or_default()
    }

    /// Drop every root for which `keep` returns false.
    ///
    /// Returns the number of roots removed.
    pub fn retain_folders(&mut self, mut keep: impl FnMut(&Path) -> bool) -> usize {
        let before = self.folders.len();
        self.folders.retain(|root, _| keep(root));
        before - self.folders.len()
    }

    /// Number of cached roots.
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    /// Total clip records across roots.
    pub fn clip_count(&self) -> usize {
        self.folders.values().map(|f| f.clips.len()).sum()
    }

    /// Total frame-image records across roots.
    pub fn frame_count(&self) -> usize {
        self.folders.values().map(|f| f.frames.len()).sum()
    }

    /// Merge all roots into one read-only view.
    pub fn catalog(&self) -> Catalog {
        Catalog::from_folders(self.folders.values())
    }
}
