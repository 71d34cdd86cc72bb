//! ffmpeg command options builder.
//!
//! Builds command-line tokens for a concat-demuxer re-encode. Quality
//! parameters come from the [`FidelityMode`]:
//!
//! - **Preview**: `-preset veryfast -crf 23`
//! - **Archival**: `-preset veryslow -crf 17`

use std::path::Path;

use crate::models::FidelityMode;

/// Video codec used for every concatenation.
pub const VIDEO_CODEC: &str = "libx264";

/// Pixel format for broad player compatibility.
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Builder for ffmpeg command-line options.
pub struct EncoderArgsBuilder<'a> {
    list_path: &'a Path,
    output_path: &'a Path,
    mode: FidelityMode,
}

impl<'a> EncoderArgsBuilder<'a> {
    /// Create a new options builder.
    pub fn new(list_path: &'a Path, output_path: &'a Path) -> Self {
        Self {
            list_path,
            output_path,
            mode: FidelityMode::default(),
        }
    }

    /// Set the fidelity mode.
    pub fn mode(mut self, mode: FidelityMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the complete ffmpeg argument tokens.
    pub fn build(&self) -> Vec<String> {
        let mut tokens = Vec::new();

        // Overwrite without prompting
        tokens.push("-y".to_string());

        // Input: concat demuxer, absolute paths allowed
        tokens.extend(["-f", "concat", "-safe", "0", "-i"].map(String::from));
        tokens.push(self.list_path.to_string_lossy().to_string());

        self.add_video_options(&mut tokens);

        tokens.push(self.output_path.to_string_lossy().to_string());
        tokens
    }

    fn add_video_options(&self, tokens: &mut Vec<String>) {
        tokens.push("-c:v".to_string());
        tokens.push(VIDEO_CODEC.to_string());
        tokens.push("-preset".to_string());
        tokens.push(self.mode.preset().to_string());
        tokens.push("-crf".to_string());
        tokens.push(self.mode.crf().to_string());
        tokens.push("-pix_fmt".to_string());
        tokens.push(PIXEL_FORMAT.to_string());
    }
}
