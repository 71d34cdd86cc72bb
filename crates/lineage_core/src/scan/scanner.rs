//! Incremental folder scanner.
//!
//! Walks every configured root, classifies files into clips and frame
//! images, and brings the per-root cache up to date. Only files whose
//! modification time changed are re-extracted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use walkdir::WalkDir;

use super::cache::LineageCache;
use crate::config::ScanSettings;
use crate::extraction::MetadataExtractor;
use crate::models::{ClipRecord, FrameImageRecord};

/// Which files the scanner picks up.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Clip extensions, lowercase, without dot.
    clip_extensions: Vec<String>,
    /// Naming convention of frame images (matched on the file name).
    frame_pattern: Regex,
}

impl ScanOptions {
    /// Create options from extensions and a compiled frame pattern.
    pub fn new(clip_extensions: &[impl AsRef<str>], frame_pattern: Regex) -> Self {
        Self {
            clip_extensions: clip_extensions
                .iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            frame_pattern,
        }
    }

    /// Build options from settings, compiling the frame pattern.
    pub fn from_settings(settings: &ScanSettings) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&settings.frame_pattern)?;
        Ok(Self::new(&settings.clip_extensions, pattern))
    }

    /// The frame-image naming pattern.
    pub fn frame_pattern(&self) -> &Regex {
        &self.frame_pattern
    }

    fn is_clip(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.clip_extensions.iter().any(|c| *c == e)
            })
            .unwrap_or(false)
    }

    fn is_frame(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| self.frame_pattern.is_match(n))
            .unwrap_or(false)
    }
}

/// A root folder that could not be scanned.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRoot {
    /// Folder as configured.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Summary of a scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Roots walked successfully.
    pub roots_scanned: usize,
    /// Roots that were missing or unreadable.
    pub skipped: Vec<SkippedRoot>,
    /// Roots dropped from the cache because they are no longer configured.
    pub folders_pruned: usize,
    /// Clips in the merged view after the scan.
    pub clips: usize,
    /// Frame images in the merged view after the scan.
    pub frames: usize,
    /// Clips whose metadata was (re-)extracted.
    pub extracted: usize,
    /// Frame images whose record was refreshed.
    pub frames_refreshed: usize,
    /// Records removed because their file disappeared.
    pub removed: usize,
    /// Why the updated cache could not be saved, if it could not.
    pub cache_error: Option<String>,
}

/// Timestamps of a file found on disk.
#[derive(Debug, Clone, Copy)]
struct FileStamp {
    mtime: f64,
    /// Creation time, or mtime where unsupported.
    created: f64,
}

/// Files of one root, keyed by resolved path.
#[derive(Debug, Default)]
struct FolderListing {
    clips: BTreeMap<PathBuf, FileStamp>,
    frames: BTreeMap<PathBuf, FileStamp>,
}

/// Incremental scanner over configured root folders.
///
/// Only one scan may run against a given cache at a time; the `&mut`
/// borrow enforces that within a thread, [`crate::worker`] across threads.
pub struct FolderScanner {
    extractor: Box<dyn MetadataExtractor>,
    options: ScanOptions,
}

impl FolderScanner {
    /// Create a scanner.
    pub fn new(extractor: Box<dyn MetadataExtractor>, options: ScanOptions) -> Self {
        Self { extractor, options }
    }

    /// Scan options in use.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan `folders` and update `cache` in place.
    ///
    /// Missing or unreadable roots are skipped and reported. Roots no longer
    /// configured are dropped from the cache. Never fails.
    pub fn scan(&self, folders: &[PathBuf], cache: &mut LineageCache) -> ScanReport {
        let mut report = ScanReport::default();

        let mut roots: Vec<PathBuf> = Vec::new();
        for folder in folders {
            match resolve_root(folder) {
                Ok(root) => {
                    if !roots.contains(&root) {
                        roots.push(root);
                    }
                }
                Err(reason) => {
                    tracing::warn!("Skipping folder {}: {}", folder.display(), reason);
                    report.skipped.push(SkippedRoot {
                        path: folder.clone(),
                        reason,
                    });
                }
            }
        }

        report.folders_pruned = cache.retain_folders(|root| roots.iter().any(|r| r == root));
        if report.folders_pruned > 0 {
            tracing::info!("Dropped {} folders from cache", report.folders_pruned);
        }

        for root in &roots {
            self.scan_root(root, cache, &mut report);
            report.roots_scanned += 1;
        }

        let catalog = cache.catalog();
        report.clips = catalog.clip_count();
        report.frames = catalog.frame_count();

        tracing::info!(
            "Scan complete: {} clips, {} frame images ({} extracted, {} removed, {} roots skipped)",
            report.clips,
            report.frames,
            report.extracted,
            report.removed,
            report.skipped.len()
        );

        report
    }

    /// Bring one root's cache entry up to date.
    fn scan_root(&self, root: &Path, cache: &mut LineageCache, report: &mut ScanReport) {
        tracing::debug!("Scanning {}", root.display());
        let listing = self.list_files(root);
        let folder = cache.folder_entry(root);

        // Remove deleted
        let before = folder.clips.len() + folder.frames.len();
        folder.clips.retain(|path, _| listing.clips.contains_key(path));
        folder.frames.retain(|path, _| listing.frames.contains_key(path));
        report.removed += before - (folder.clips.len() + folder.frames.len());

        for (path, stamp) in &listing.clips {
            let fresh = folder
                .clips
                .get(path)
                .map_or(false, |cached| cached.mtime == stamp.mtime);
            if fresh {
                continue;
            }

            let meta = self.extractor.extract(path);
            folder.clips.insert(
                path.clone(),
                ClipRecord {
                    time: stamp.created,
                    mtime: stamp.mtime,
                    workflow: meta.workflow,
                    seed_image: meta.seed_image,
                },
            );
            report.extracted += 1;
        }

        for (path, stamp) in &listing.frames {
            let fresh = folder
                .frames
                .get(path)
                .map_or(false, |cached| cached.mtime == stamp.mtime);
            if !fresh {
                folder
                    .frames
                    .insert(path.clone(), FrameImageRecord::new(path.clone(), stamp.mtime));
                report.frames_refreshed += 1;
            }
        }
    }

    /// Recursively list clips and frame images under a root.
    ///
    /// Unreadable entries are skipped.
    fn list_files(&self, root: &Path) -> FolderListing {
        let mut listing = FolderListing::default();

        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let is_clip = self.options.is_clip(path);
            if !is_clip && !self.options.is_frame(path) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let mtime = match metadata.modified() {
                Ok(t) => epoch_secs(t),
                Err(e) => {
                    tracing::debug!("No modification time for {}: {}", path.display(), e);
                    continue;
                }
            };
            let created = metadata.created().map(epoch_secs).unwrap_or(mtime);
            let stamp = FileStamp { mtime, created };

            let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if is_clip {
                listing.clips.insert(resolved, stamp);
            } else {
                listing.frames.insert(resolved, stamp);
            }
        }

        listing
    }
}

/// Canonicalise a configured folder and check it can be listed.
fn resolve_root(folder: &Path) -> Result<PathBuf, String> {
    let root = fs::canonicalize(folder).map_err(|e| e.to_string())?;
    if !root.is_dir() {
        return Err("not a directory".to_string());
    }
    fs::read_dir(&root).map_err(|e| e.to_string())?;
    Ok(root)
}

/// Seconds since the Unix epoch (negative before it).
pub(crate) fn epoch_secs(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ClipMetadata;
    use crate::lineage::LineageGraph;
    use crate::logging::init_test_tracing;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tempfile::tempdir;

    /// Extractor returning canned seeds and counting calls per file.
    #[derive(Default, Clone)]
    struct CountingExtractor {
        seeds: Arc<HashMap<String, String>>,
        calls: Arc<Mutex<HashMap<PathBuf, usize>>>,
    }

    impl CountingExtractor {
        fn with_seeds(seeds: &[(&str, &str)]) -> Self {
            Self {
                seeds: Arc::new(
                    seeds
                        .iter()
                        .map(|(clip, seed)| (clip.to_string(), seed.to_string()))
                        .collect(),
                ),
                calls: Arc::default(),
            }
        }

        fn calls_for(&self, path: &Path) -> usize {
            let resolved = fs::canonicalize(path).unwrap();
            self.calls.lock().get(&resolved).copied().unwrap_or(0)
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().values().sum()
        }
    }

    impl MetadataExtractor for CountingExtractor {
        fn extract(&self, path: &Path) -> ClipMetadata {
            *self.calls.lock().entry(path.to_path_buf()).or_default() += 1;
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            ClipMetadata {
                workflow: None,
                seed_image: self.seeds.get(&name).cloned(),
            }
        }
    }

    fn options() -> ScanOptions {
        ScanOptions::from_settings(&ScanSettings::default()).unwrap()
    }

    fn touch(path: &Path, secs: u64) {
        let file = fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
    }

    fn write(path: &Path, secs: u64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
        touch(path, secs);
    }

    #[test]
    fn classifies_clips_and_frames_recursively() {
        init_test_tracing();
        let dir = tempdir().unwrap();
        write(&dir.path().join("a.mp4"), 1_000);
        write(&dir.path().join("nested/B.MP4"), 1_010);
        write(&dir.path().join("nested/WAN22_LASTFRAME_01_.PNG"), 1_005);
        write(&dir.path().join("notes.txt"), 1_000);
        write(&dir.path().join("portrait.png"), 1_000);

        let extractor = CountingExtractor::default();
        let scanner = FolderScanner::new(Box::new(extractor.clone()), options());
        let mut cache = LineageCache::new();
        let report = scanner.scan(&[dir.path().to_path_buf()], &mut cache);

        assert_eq!(report.roots_scanned, 1);
        assert_eq!(report.clips, 2);
        assert_eq!(report.frames, 1);
        assert_eq!(report.extracted, 2);
        assert_eq!(extractor.total_calls(), 2);
    }

    #[test]
    fn rescan_without_changes_is_idempotent() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("first.mp4"), 1_000);
        write(&dir.path().join("wan22_lastframe_01.png"), 1_020);
        write(&dir.path().join("second.mp4"), 1_025);

        let extractor = CountingExtractor::with_seeds(&[("second.mp4", "wan22_lastframe_01.png")]);
        let scanner = FolderScanner::new(Box::new(extractor.clone()), options());
        let folders = vec![dir.path().to_path_buf()];

        let mut cache = LineageCache::new();
        scanner.scan(&folders, &mut cache);
        let first_json = cache.to_json().unwrap();
        let first_graph = LineageGraph::build(&cache.catalog(), 30.0);

        let report = scanner.scan(&folders, &mut cache);
        assert_eq!(report.extracted, 0);
        assert_eq!(report.frames_refreshed, 0);
        assert_eq!(cache.to_json().unwrap(), first_json);
        assert_eq!(LineageGraph::build(&cache.catalog(), 30.0), first_graph);
        assert_eq!(extractor.total_calls(), 2);
    }

    #[test]
    fn touching_a_clip_re_extracts_only_that_clip() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.mp4");
        let second = dir.path().join("second.mp4");
        write(&first, 1_000);
        write(&second, 2_000);

        let extractor = CountingExtractor::default();
        let scanner = FolderScanner::new(Box::new(extractor.clone()), options());
        let folders = vec![dir.path().to_path_buf()];
        let mut cache = LineageCache::new();
        scanner.scan(&folders, &mut cache);

        touch(&first, 1_500);
        let report = scanner.scan(&folders, &mut cache);

        assert_eq!(report.extracted, 1);
        assert_eq!(extractor.calls_for(&first), 2);
        assert_eq!(extractor.calls_for(&second), 1);
    }

    #[test]
    fn deleted_files_are_removed_from_cache() {
        let dir = tempdir().unwrap();
        let clip = dir.path().join("gone.mp4");
        let frame = dir.path().join("wan22_lastframe_gone.png");
        write(&clip, 1_000);
        write(&frame, 1_000);
        write(&dir.path().join("kept.mp4"), 1_000);

        let scanner = FolderScanner::new(Box::new(CountingExtractor::default()), options());
        let folders = vec![dir.path().to_path_buf()];
        let mut cache = LineageCache::new();
        scanner.scan(&folders, &mut cache);

        fs::remove_file(&clip).unwrap();
        fs::remove_file(&frame).unwrap();
        let report = scanner.scan(&folders, &mut cache);

        assert_eq!(report.removed, 2);
        assert_eq!(report.clips, 1);
        assert_eq!(report.frames, 0);
    }

    #[test]
    fn missing_root_is_skipped_and_others_scanned() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good");
        write(&good.join("clip.mp4"), 1_000);

        let scanner = FolderScanner::new(Box::new(CountingExtractor::default()), options());
        let mut cache = LineageCache::new();
        let report = scanner.scan(&[dir.path().join("missing"), good.clone()], &mut cache);

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, dir.path().join("missing"));
        assert_eq!(report.roots_scanned, 1);
        assert_eq!(report.clips, 1);
    }

    #[test]
    fn unconfigured_roots_are_pruned() {
        let dir = tempdir().unwrap();
        let one = dir.path().join("one");
        let two = dir.path().join("two");
        write(&one.join("a.mp4"), 1_000);
        write(&two.join("b.mp4"), 1_000);

        let scanner = FolderScanner::new(Box::new(CountingExtractor::default()), options());
        let mut cache = LineageCache::new();
        scanner.scan(&[one.clone(), two.clone()], &mut cache);
        assert_eq!(cache.folder_count(), 2);

        let report = scanner.scan(&[two], &mut cache);
        assert_eq!(report.folders_pruned, 1);
        assert_eq!(cache.folder_count(), 1);
        assert_eq!(report.clips, 1);
    }
}
