//! Concatenation pipeline execution.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

use super::list::write_list;
use super::options_builder::EncoderArgsBuilder;
use crate::config::EncoderSettings;
use crate::models::FidelityMode;

/// Lines of encoder stderr kept in an error.
const STDERR_TAIL_LINES: usize = 20;

/// Errors from a concatenation run.
#[derive(Error, Debug)]
pub enum ConcatError {
    #[error("No clips to concatenate")]
    EmptyInput,

    #[error("An output path is required for {0} mode")]
    MissingOutput(FidelityMode),

    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to execute {tool}: {source}")]
    ToolExecutionFailed {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} failed with exit code {exit_code}: {stderr}")]
    EncoderFailed {
        tool: String,
        exit_code: i32,
        stderr: String,
    },
}

impl ConcatError {
    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for concatenation.
pub type ConcatResult<T> = Result<T, ConcatError>;

/// Joins an ordered clip list into one video with ffmpeg.
///
/// Runs synchronously; see [`crate::worker::spawn_concat`] to run it off the
/// calling thread. Runs into disjoint output paths may proceed concurrently.
#[derive(Debug, Clone)]
pub struct ConcatPipeline {
    ffmpeg_path: String,
    temp_dir: PathBuf,
}

impl ConcatPipeline {
    /// Create a pipeline from encoder settings.
    pub fn new(settings: &EncoderSettings) -> Self {
        Self::with_tool(settings.ffmpeg_path.clone(), settings.temp_dir())
    }

    /// Create a pipeline with an explicit tool and temp directory.
    pub fn with_tool(ffmpeg_path: impl Into<String>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Concatenate `clips` in order and return the output path.
    ///
    /// A single clip is returned as-is without running the encoder.
    /// `output` is required in archival mode; preview mode writes to a new
    /// file in the temp directory when it is `None`. When the encoder
    /// fails, no file is left at the output path. A file that existed
    /// before the run is otherwise left alone.
    pub fn run(
        &self,
        clips: &[PathBuf],
        mode: FidelityMode,
        output: Option<&Path>,
    ) -> ConcatResult<PathBuf> {
        match clips {
            [] => return Err(ConcatError::EmptyInput),
            [single] => {
                tracing::debug!("Single clip, nothing to concatenate: {}", single.display());
                return Ok(single.clone());
            }
            _ => {}
        }

        // Whether a file at the output path on failure can only be ours
        let (output_path, owned) = match (output, mode) {
            (Some(path), _) => (path.to_path_buf(), !path.exists()),
            (None, FidelityMode::Preview) => (self.preview_output()?, true),
            (None, FidelityMode::Archival) => return Err(ConcatError::MissingOutput(mode)),
        };

        match self.encode(clips, mode, &output_path) {
            Ok(()) => {
                tracing::info!(
                    "Concatenated {} clips ({}) into {}",
                    clips.len(),
                    mode,
                    output_path.display()
                );
                Ok(output_path)
            }
            Err(e) => {
                if owned || matches!(e, ConcatError::EncoderFailed { .. }) {
                    remove_partial(&output_path);
                }
                Err(e)
            }
        }
    }

    /// Write the list file and run the encoder once.
    fn encode(&self, clips: &[PathBuf], mode: FidelityMode, output: &Path) -> ConcatResult<()> {
        fs::create_dir_all(&self.temp_dir)
            .map_err(|e| ConcatError::io_error("creating temp directory", e))?;
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ConcatError::io_error("creating output directory", e))?;
            }
        }

        // Removed when dropped at the end of this function
        let list = write_list(clips, &self.temp_dir)
            .map_err(|e| ConcatError::io_error("writing concat list", e))?;

        let tokens = EncoderArgsBuilder::new(list.path(), output).mode(mode).build();
        tracing::debug!("Running {} {}", self.ffmpeg_path, tokens.join(" "));

        let result = Command::new(&self.ffmpeg_path)
            .args(&tokens)
            .output()
            .map_err(|source| ConcatError::ToolExecutionFailed {
                tool: self.ffmpeg_path.clone(),
                source,
            })?;

        if !result.status.success() {
            let exit_code = result.status.code().unwrap_or(-1);
            let stderr = stderr_tail(&String::from_utf8_lossy(&result.stderr));
            tracing::warn!("{} exited with code {}", self.ffmpeg_path, exit_code);
            return Err(ConcatError::EncoderFailed {
                tool: self.ffmpeg_path.clone(),
                exit_code,
                stderr,
            });
        }

        Ok(())
    }

    /// Reserve a fresh preview output file in the temp directory.
    fn preview_output(&self) -> ConcatResult<PathBuf> {
        fs::create_dir_all(&self.temp_dir)
            .map_err(|e| ConcatError::io_error("creating temp directory", e))?;
        let reserved = tempfile::Builder::new()
            .prefix("lineage_preview_")
            .suffix(".mp4")
            .tempfile_in(&self.temp_dir)
            .map_err(|e| ConcatError::io_error("creating preview file", e))?;
        reserved
            .into_temp_path()
            .keep()
            .map_err(|e| ConcatError::io_error("creating preview file", e.into()))
    }
}

/// Default archival output next to `target`: `combined_<timestamp>.mp4`.
pub fn default_archival_output(target: &Path) -> PathBuf {
    archival_output_at(target, Local::now().naive_local())
}

fn archival_output_at(target: &Path, now: NaiveDateTime) -> PathBuf {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("combined_{}.mp4", now.format("%Y%m%d_%H%M%S")))
}

/// Delete a partially written output.
fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove partial output {}: {}", path.display(), e),
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn clips(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from(format!("/r/{n}"))).collect()
    }

    #[test]
    fn single_clip_skips_encoder() {
        let dir = tempdir().unwrap();
        // Would fail if it were ever spawned
        let pipeline = ConcatPipeline::with_tool("/nonexistent/ffmpeg", dir.path());
        let input = clips(&["only.mp4"]);

        let out = pipeline.run(&input, FidelityMode::Archival, None).unwrap();
        assert_eq!(out, input[0]);
    }

    #[test]
    fn empty_list_is_rejected() {
        let pipeline = ConcatPipeline::with_tool("ffmpeg", std::env::temp_dir());
        assert!(matches!(
            pipeline.run(&[], FidelityMode::Preview, None),
            Err(ConcatError::EmptyInput)
        ));
    }

    #[test]
    fn archival_requires_output() {
        let dir = tempdir().unwrap();
        let pipeline = ConcatPipeline::with_tool("/nonexistent/ffmpeg", dir.path());
        let result = pipeline.run(&clips(&["a.mp4", "b.mp4"]), FidelityMode::Archival, None);
        assert!(matches!(result, Err(ConcatError::MissingOutput(FidelityMode::Archival))));
    }

    #[test]
    fn missing_tool_leaves_no_preview_file() {
        let dir = tempdir().unwrap();
        let pipeline = ConcatPipeline::with_tool("/nonexistent/ffmpeg", dir.path());
        let result = pipeline.run(&clips(&["a.mp4", "b.mp4"]), FidelityMode::Preview, None);

        assert!(matches!(result, Err(ConcatError::ToolExecutionFailed { .. })));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_tool_keeps_existing_output() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join("keep_me.mp4");
        fs::write(&existing, b"earlier render").unwrap();
        let pipeline = ConcatPipeline::with_tool("/nonexistent/ffmpeg", dir.path());

        let result = pipeline.run(
            &clips(&["a.mp4", "b.mp4"]),
            FidelityMode::Archival,
            Some(&existing),
        );

        assert!(matches!(result, Err(ConcatError::ToolExecutionFailed { .. })));
        assert_eq!(fs::read(&existing).unwrap(), b"earlier render");
    }

    #[test]
    fn archival_name_uses_target_folder() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        assert_eq!(
            archival_output_at(Path::new("/renders/day1/clip.mp4"), now),
            PathBuf::from("/renders/day1/combined_20240309_140507.mp4")
        );
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let long: String = (0..50).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(&long);
        assert_eq!(tail.lines().count(), STDERR_TAIL_LINES);
        assert!(tail.ends_with("line 49"));
    }

    #[cfg(unix)]
    mod with_fake_encoder {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Shell script standing in for ffmpeg.
        ///
        /// Logs each call, copies the concat list (7th argument) next to the
        /// output (last argument), writes the output, then exits with `code`.
        fn fake_ffmpeg(dir: &Path, code: i32) -> PathBuf {
            let script = dir.join("ffmpeg");
            let calls = dir.join("calls.log");
            let body = format!(
                "#!/bin/sh\n\
                 echo call >> '{calls}'\n\
                 for last; do :; done\n\
                 cp \"$7\" \"$last.list\"\n\
                 echo partial > \"$last\"\n\
                 echo 'Invalid data found when processing input' >&2\n\
                 exit {code}\n",
                calls = calls.display(),
            );
            fs::write(&script, body).unwrap();
            fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
            script
        }

        fn call_count(dir: &Path) -> usize {
            fs::read_to_string(dir.join("calls.log"))
                .map(|s| s.lines().count())
                .unwrap_or(0)
        }

        #[test]
        fn failure_removes_partial_output() {
            let dir = tempdir().unwrap();
            let script = fake_ffmpeg(dir.path(), 1);
            let pipeline = ConcatPipeline::with_tool(script.to_str().unwrap(), dir.path());
            let output = dir.path().join("out").join("combined.mp4");

            let err = pipeline
                .run(&clips(&["a.mp4", "b.mp4"]), FidelityMode::Archival, Some(&output))
                .unwrap_err();

            match err {
                ConcatError::EncoderFailed {
                    exit_code, stderr, ..
                } => {
                    assert_eq!(exit_code, 1);
                    assert!(stderr.contains("Invalid data"));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(!output.exists());
            assert_eq!(call_count(dir.path()), 1);
        }

        #[test]
        fn encoder_failure_removes_overwritten_output() {
            let dir = tempdir().unwrap();
            let script = fake_ffmpeg(dir.path(), 1);
            let pipeline = ConcatPipeline::with_tool(script.to_str().unwrap(), dir.path());
            let output = dir.path().join("combined.mp4");
            fs::write(&output, b"earlier render").unwrap();

            let result = pipeline.run(
                &clips(&["a.mp4", "b.mp4"]),
                FidelityMode::Archival,
                Some(&output),
            );

            assert!(matches!(result, Err(ConcatError::EncoderFailed { .. })));
            assert!(!output.exists());
        }

        #[test]
        fn success_writes_ordered_list_and_output() {
            let dir = tempdir().unwrap();
            let script = fake_ffmpeg(dir.path(), 0);
            let pipeline = ConcatPipeline::with_tool(script.to_str().unwrap(), dir.path());
            let output = dir.path().join("combined.mp4");
            let input = vec![
                PathBuf::from("/r/first.mp4"),
                PathBuf::from("/r/it's second.mp4"),
            ];

            let out = pipeline
                .run(&input, FidelityMode::Archival, Some(&output))
                .unwrap();

            assert_eq!(out, output);
            assert!(output.exists());
            let list = fs::read_to_string(dir.path().join("combined.mp4.list")).unwrap();
            assert_eq!(list, "file '/r/first.mp4'\nfile '/r/it'\\''s second.mp4'\n");
            assert_eq!(call_count(dir.path()), 1);
        }

        #[test]
        fn preview_without_output_uses_temp_dir() {
            let dir = tempdir().unwrap();
            let script = fake_ffmpeg(dir.path(), 0);
            let temp = dir.path().join("tmp");
            let pipeline = ConcatPipeline::with_tool(script.to_str().unwrap(), &temp);

            let out = pipeline
                .run(&clips(&["a.mp4", "b.mp4"]), FidelityMode::Preview, None)
                .unwrap();

            assert!(out.starts_with(&temp));
            assert!(out.exists());
        }
    }
}
