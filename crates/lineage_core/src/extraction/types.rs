//! Types for metadata extraction.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Workflow;

/// Error type for extraction operations.
///
/// These never escape [`super::MetadataExtractor::extract`]; they are
/// logged and degrade to empty metadata.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Failed to execute external tool.
    #[error("{tool} execution failed: {message}")]
    ToolExecutionFailed { tool: String, message: String },

    /// External tool exited with an error.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// Embedded metadata or tool output is not valid JSON.
    #[error("Failed to parse {what}: {source}")]
    ParseError {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ExtractionError {
    /// Create a parse error with context.
    pub fn parse_error(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::ParseError {
            what: what.into(),
            source,
        }
    }
}

/// Result type for extraction operations.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Metadata pulled out of one clip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipMetadata {
    /// Embedded workflow document.
    pub workflow: Option<Workflow>,
    /// Basename of the seed frame image referenced by the workflow.
    pub seed_image: Option<String>,
}

impl ClipMetadata {
    /// Metadata for a clip without a (usable) workflow.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if a workflow was found.
    pub fn has_workflow(&self) -> bool {
        self.workflow.is_some()
    }
}

