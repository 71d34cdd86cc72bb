//! Clip and frame-image records as stored in the scan cache.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::workflow::Workflow;

/// Identity of a clip: its canonical absolute path.
pub type ClipId = PathBuf;

/// A tracked clip file.
///
/// The clip's path is the key it is stored under, not a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRecord {
    /// Creation time (seconds since Unix epoch), modification time where
    /// the platform has no creation time.
    pub time: f64,
    /// Modification time when the record was extracted (cache validity).
    pub mtime: f64,
    /// Workflow document embedded in the clip, if any.
    #[serde(default)]
    pub workflow: Option<Workflow>,
    /// Basename of the frame image this clip was seeded from.
    #[serde(default)]
    pub seed_image: Option<String>,
}

impl ClipRecord {
    /// Create a record with no extracted metadata.
    pub fn new(time: f64, mtime: f64) -> Self {
        Self {
            time,
            mtime,
            workflow: None,
            seed_image: None,
        }
    }

    /// Attach an extracted workflow.
    pub fn with_workflow(mut self, workflow: Workflow) -> Self {
        self.workflow = Some(workflow);
        self
    }

    /// Attach a seed-image reference.
    pub fn with_seed_image(mut self, name: impl Into<String>) -> Self {
        self.seed_image = Some(name.into());
        self
    }
}

/// A still "last frame" image used to seed a follow-on clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameImageRecord {
    /// Resolved path of the image.
    pub path: PathBuf,
    /// Timestamp used for matching (modification time).
    pub time: f64,
    /// Modification time when the record was taken (cache validity).
    pub mtime: f64,
}

impl FrameImageRecord {
    /// Create a frame-image record whose matching time is its mtime.
    pub fn new(path: impl Into<PathBuf>, mtime: f64) -> Self {
        Self {
            path: path.into(),
            time: mtime,
            mtime,
        }
    }

    /// File name of the image, as referenced from workflows.
    pub fn basename(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Directory containing the image.
    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }
}
