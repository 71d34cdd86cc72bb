//! Merged, read-only view over all cached roots.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::cache::FolderCache;
use crate::models::{ClipId, ClipRecord, FrameImageRecord};

/// Snapshot of every clip and frame image known after a scan.
///
/// Built from the cache and never mutated; a new scan produces a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    clips: BTreeMap<ClipId, ClipRecord>,
    frames: BTreeMap<PathBuf, FrameImageRecord>,
    /// Frame basename -> frame paths (ascending).
    frames_by_name: BTreeMap<String, Vec<PathBuf>>,
}

impl Catalog {
    /// Build a catalog from explicit records.
    pub fn from_records(
        clips: impl IntoIterator<Item = (ClipId, ClipRecord)>,
        frames: impl IntoIterator<Item = FrameImageRecord>,
    ) -> Self {
        let clips: BTreeMap<_, _> = clips.into_iter().collect();
        let frames: BTreeMap<_, _> = frames
            .into_iter()
            .map(|frame| (frame.path.clone(), frame))
            .collect();

        let mut frames_by_name: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for frame in frames.values() {
            if let Some(name) = frame.basename() {
                frames_by_name
                    .entry(name.to_string())
                    .or_default()
                    .push(frame.path.clone());
            }
        }

        Self {
            clips,
            frames,
            frames_by_name,
        }
    }

    /// Merge per-root caches.
    pub(crate) fn from_folders<'a>(folders: impl Iterator<Item = &'a FolderCache>) -> Self {
        let mut clips = Vec::new();
        let mut frames = Vec::new();
        for folder in folders {
            clips.extend(folder.clips.iter().map(|(p, r)| (p.clone(), r.clone())));
            frames.extend(folder.frames.values().cloned());
        }
        Self::from_records(clips, frames)
    }

    /// All clips, ordered by path.
    pub fn clips(&self) -> impl Iterator<Item = (&Path, &ClipRecord)> {
        self.clips.iter().map(|(id, record)| (id.as_path(), record))
    }

    /// Look up a clip.
    pub fn clip(&self, id: &Path) -> Option<&ClipRecord> {
        self.clips.get(id)
    }

    /// Check if a clip is known.
    pub fn contains_clip(&self, id: &Path) -> bool {
        self.clips.contains_key(id)
    }

    /// All frame images, ordered by path.
    pub fn frames(&self) -> impl Iterator<Item = &FrameImageRecord> {
        self.frames.values()
    }

    /// Number of clips.
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Number of frame images.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Resolve the seed-image reference of a clip to a frame image.
    ///
    /// The same basename may exist in several folders. The frame sharing
    /// the longest directory prefix with the clip wins (same folder first),
    /// ties go to the lowest path.
    pub fn seed_frame(&self, clip_id: &Path) -> Option<&FrameImageRecord> {
        let name = self.clips.get(clip_id)?.seed_image.as_deref()?;
        let candidates = self.frames_by_name.get(name)?;
        let clip_dir = clip_id.parent().unwrap_or(clip_id);

        let mut best: Option<(usize, &PathBuf)> = None;
        for path in candidates {
            let frame_dir = path.parent().unwrap_or(path);
            let shared = shared_components(clip_dir, frame_dir);
            if best.map_or(true, |(score, _)| shared > score) {
                best = Some((shared, path));
            }
        }
        best.and_then(|(_, path)| self.frames.get(path))
    }
}

/// Number of leading path components two paths have in common.
fn shared_components(a: &Path, b: &Path) -> usize {
    a.components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .count()
}
