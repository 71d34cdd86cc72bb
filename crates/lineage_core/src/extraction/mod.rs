//! Clip metadata extraction.
//!
//! Pulls the embedded workflow out of a clip and finds the frame image the
//! clip was seeded from:
//!
//! - **Probe**: read the container `comment` tag with ffprobe
//! - **Comment**: decode the tag into a typed [`Workflow`]
//! - **Seed image**: first `LoadImage` node whose image matches the
//!   frame-image naming pattern
//!
//! Extraction never fails from the caller's point of view. Any IO, tool or
//! parse failure is logged and yields [`ClipMetadata::empty`].
//!
//! # Usage
//!
//! ```ignore
//! use lineage_core::extraction::{FfprobeExtractor, MetadataExtractor};
//!
//! let extractor = FfprobeExtractor::new("ffprobe", frame_pattern);
//! let meta = extractor.extract(Path::new("/renders/wan22_0101.mp4"));
//! println!("seeded from {:?}", meta.seed_image);
//! ```

mod comment;
mod probe;
mod types;

use std::path::Path;

use regex::Regex;

pub use comment::{parse_comment, PROMPT_KEY, WORKFLOW_KEY};
pub use probe::{read_comment_tag, COMMENT_TAG};
pub use types::{ClipMetadata, ExtractionError, ExtractionResult};

use crate::models::Workflow;

/// Source of per-clip metadata used by the folder scanner.
pub trait MetadataExtractor: Send + Sync {
    /// Extract workflow and seed-image reference from a clip.
    ///
    /// Must not fail: problems degrade to empty metadata.
    fn extract(&self, path: &Path) -> ClipMetadata;
}

/// Extractor backed by the ffprobe executable.
pub struct FfprobeExtractor {
    /// ffprobe executable (name on PATH or absolute path).
    ffprobe_path: String,
    /// Naming convention of frame images.
    frame_pattern: Regex,
}

impl FfprobeExtractor {
    /// Create an extractor.
    pub fn new(ffprobe_path: impl Into<String>, frame_pattern: Regex) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            frame_pattern,
        }
    }

    /// Read and decode the workflow of a clip.
    pub fn read_workflow(&self, path: &Path) -> ExtractionResult<Option<Workflow>> {
        match read_comment_tag(&self.ffprobe_path, path)? {
            Some(raw) => parse_comment(&raw),
            None => Ok(None),
        }
    }
}

impl MetadataExtractor for FfprobeExtractor {
    fn extract(&self, path: &Path) -> ClipMetadata {
        match self.read_workflow(path) {
            Ok(Some(workflow)) => {
                let seed_image = workflow.seed_image(&self.frame_pattern);
                tracing::debug!(
                    "Workflow with {} nodes in {} (seed: {:?})",
                    workflow.len(),
                    path.display(),
                    seed_image
                );
                ClipMetadata {
                    workflow: Some(workflow),
                    seed_image,
                }
            }
            Ok(None) => {
                tracing::debug!("No workflow in {}", path.display());
                ClipMetadata::empty()
            }
            Err(e) => {
                tracing::warn!("Metadata extraction failed for {}: {}", path.display(), e);
                ClipMetadata::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(ffprobe: &str) -> FfprobeExtractor {
        FfprobeExtractor::new(ffprobe, Regex::new(r"(?i)^wan22_lastframe_.*\.png$").unwrap())
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let meta = extractor("ffprobe").extract(Path::new("/nonexistent/clip.mp4"));
        assert_eq!(meta, ClipMetadata::empty());
    }

    #[test]
    fn missing_tool_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.mp4");
        std::fs::write(&clip, b"not really a container").unwrap();

        let meta = extractor("/nonexistent/bin/ffprobe").extract(&clip);
        assert!(!meta.has_workflow());
        assert!(meta.seed_image.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn seed_image_from_probed_comment() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.mp4");
        std::fs::write(&clip, b"container").unwrap();

        // Fake ffprobe printing a format_tags document
        let comment = serde_json::json!({
            "prompt": serde_json::json!({
                "7": {"class_type": "LoadImage", "inputs": {"image": "wan22_lastframe_0101_.png"}}
            }).to_string()
        })
        .to_string();
        let output = serde_json::json!({"format": {"tags": {"comment": comment}}}).to_string();
        let json_path = dir.path().join("probe.json");
        std::fs::write(&json_path, output).unwrap();

        let script = dir.path().join("ffprobe");
        std::fs::write(&script, format!("#!/bin/sh\ncat '{}'\n", json_path.display())).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let meta = extractor(script.to_str().unwrap()).extract(&clip);
        assert!(meta.has_workflow());
        assert_eq!(meta.seed_image.as_deref(), Some("wan22_lastframe_0101_.png"));
    }
}
