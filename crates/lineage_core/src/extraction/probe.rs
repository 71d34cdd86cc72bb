//! Container tag probing using ffprobe.
//!
//! Generated clips carry their workflow as JSON text in the container's
//! `comment` tag. ffprobe exposes it under `format.tags`.

use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;

use super::types::{ExtractionError, ExtractionResult};

/// Container tag holding the embedded workflow.
pub const COMMENT_TAG: &str = "comment";

/// Read the container comment tag of a clip.
///
/// Returns `Ok(None)` if the container has no such tag.
pub fn read_comment_tag(ffprobe: &str, path: &Path) -> ExtractionResult<Option<String>> {
    if !path.exists() {
        return Err(ExtractionError::FileNotFound(path.to_path_buf()));
    }

    tracing::debug!("Probing tags: {}", path.display());

    let output = Command::new(ffprobe)
        .args(["-v", "error", "-show_entries", "format_tags", "-of", "json"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ExtractionError::ToolExecutionFailed {
            tool: "ffprobe".to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ExtractionError::CommandFailed {
            tool: "ffprobe".to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let json: Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| ExtractionError::parse_error("ffprobe output", e))?;

    Ok(comment_from_probe_json(&json))
}

/// Pull the comment tag out of `ffprobe -show_entries format_tags` JSON.
///
/// Tag keys are matched case-insensitively (muxers differ).
fn comment_from_probe_json(json: &Value) -> Option<String> {
    let tags = json.get("format")?.get("tags")?.as_object()?;
    tags.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(COMMENT_TAG))
        .and_then(|(_, value)| value.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn probe_nonexistent_file() {
        let result = read_comment_tag("ffprobe", Path::new("/nonexistent/clip.mp4"));
        assert!(matches!(result, Err(ExtractionError::FileNotFound(_))));
    }

    #[test]
    fn comment_found_in_format_tags() {
        let json = json!({"format": {"tags": {"major_brand": "isom", "COMMENT": "{\"prompt\": \"{}\"}"}}});
        assert_eq!(
            comment_from_probe_json(&json),
            Some("{\"prompt\": \"{}\"}".to_string())
        );
    }

    #[test]
    fn missing_tags_yield_none() {
        assert_eq!(comment_from_probe_json(&json!({"format": {}})), None);
        assert_eq!(comment_from_probe_json(&json!({})), None);
    }
}
