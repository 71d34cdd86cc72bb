//! Clip concatenation with ffmpeg.
//!
//! Joins an ordered clip list (usually a backward chain) into one video by
//! re-encoding through the concat demuxer.
//!
//! # Architecture
//!
//! - **list**: writes the `file '<path>'` list the demuxer reads
//! - **options_builder**: converts a mode and paths into ffmpeg tokens
//! - **pipeline**: runs the encoder and cleans up after failures

mod list;
mod options_builder;
mod pipeline;

pub use list::{escape_path, render_list, write_list};
pub use options_builder::{EncoderArgsBuilder, PIXEL_FORMAT, VIDEO_CODEC};
pub use pipeline::{default_archival_output, ConcatError, ConcatPipeline, ConcatResult};
