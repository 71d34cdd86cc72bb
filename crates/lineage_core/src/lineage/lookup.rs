//! Lookups derived from the graph.

use std::path::Path;

use super::graph::LineageGraph;
use crate::models::FrameImageRecord;
use crate::scan::Catalog;

/// Default search window for [`output_frame`] in seconds.
pub const DEFAULT_OUTPUT_FRAME_WINDOW_SECS: f64 = 180.0;

/// Frame image a clip produced (its extracted last frame).
///
/// Uses the seed image of the clip's first successor when it resolves.
/// Otherwise picks the frame image closest in time that is strictly newer
/// than the clip and less than `window_secs` after it, ties to the lowest
/// path.
pub fn output_frame<'a>(
    catalog: &'a Catalog,
    graph: &LineageGraph,
    clip: &Path,
    window_secs: f64,
) -> Option<&'a FrameImageRecord> {
    if let Some(frame) = graph
        .successors(clip)
        .first()
        .and_then(|next| catalog.seed_frame(next))
    {
        return Some(frame);
    }

    let clip_time = catalog.clip(clip)?.time;
    catalog
        .frames()
        .filter(|f| f.time > clip_time && f.time - clip_time < window_secs)
        .min_by(|a, b| {
            (a.time - clip_time)
                .total_cmp(&(b.time - clip_time))
                .then_with(|| a.path.cmp(&b.path))
        })
}
