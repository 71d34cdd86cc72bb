//! Settings struct with JSON sections.
//!
//! The `folders` list is the working-folder configuration; every other
//! section is optional in the file and filled with defaults on load.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Working folders to scan, stored resolved.
    #[serde(default)]
    pub folders: Vec<PathBuf>,

    /// Which files count as clips and frame images.
    #[serde(default)]
    pub scan: ScanSettings,

    /// Lineage matching parameters.
    #[serde(default)]
    pub matching: MatchingSettings,

    /// External encoder configuration.
    #[serde(default)]
    pub encoder: EncoderSettings,

    /// Cache and log locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// File classification for the folder scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Clip file extensions (case-insensitive, without dot).
    #[serde(default = "default_clip_extensions")]
    pub clip_extensions: Vec<String>,

    /// Regex a frame-image file name must match.
    #[serde(default = "default_frame_pattern")]
    pub frame_pattern: String,
}

fn default_clip_extensions() -> Vec<String> {
    vec!["mp4".to_string()]
}

fn default_frame_pattern() -> String {
    r"(?i)^wan22_lastframe_.*\.png$".to_string()
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            clip_extensions: default_clip_extensions(),
            frame_pattern: default_frame_pattern(),
        }
    }
}

/// Parameters for the time-proximity matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingSettings {
    /// Maximum |clip time - frame time| (exclusive) for a predecessor.
    #[serde(default = "default_time_window")]
    pub time_window_secs: f64,

    /// Window after a clip in which its produced frame image is searched.
    #[serde(default = "default_output_frame_window")]
    pub output_frame_window_secs: f64,
}

fn default_time_window() -> f64 {
    30.0
}

fn default_output_frame_window() -> f64 {
    180.0
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            time_window_secs: default_time_window(),
            output_frame_window_secs: default_output_frame_window(),
        }
    }
}

/// External tool locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// ffmpeg executable (name on PATH or absolute path).
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,

    /// ffprobe executable (name on PATH or absolute path).
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,

    /// Directory for concat lists and preview outputs (system temp if unset).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            temp_dir: None,
        }
    }
}

impl EncoderSettings {
    /// Temp directory to use, resolving the system default.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Cache and log file locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Persisted scan cache.
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: PathBuf,
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("timeline_cache.json")
}

fn default_logs_folder() -> PathBuf {
    PathBuf::from(".logs")
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            cache_file: default_cache_file(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level written to the console.
    #[serde(default)]
    pub level: LogLevel,

    /// Also write a log file into `paths.logs_folder`.
    #[serde(default)]
    pub to_file: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_only_document_gets_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"folders": ["/a", "/b"]}"#).unwrap();
        assert_eq!(settings.folders.len(), 2);
        assert_eq!(settings.matching.time_window_secs, 30.0);
        assert_eq!(settings.scan.clip_extensions, vec!["mp4"]);
        assert_eq!(settings.encoder.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn default_frame_pattern_compiles() {
        let re = regex::Regex::new(&ScanSettings::default().frame_pattern).unwrap();
        assert!(re.is_match("WAN22_LASTFRAME_1.PNG"));
        assert!(!re.is_match("wan22_0101.png"));
    }
}
