//! Time-proximity lineage matching.
//!
//! For every clip whose seed image resolves to a known frame image, the
//! predecessor is the other clip timestamped closest to that frame image,
//! within the matching window:
//!
//! 1. Candidates: all other clips with `|clip.time - frame.time| < window`
//! 2. Order: `|dt|` ascending, clip time descending, path ascending
//! 3. First candidate wins; no candidate means the clip is a root
//!
//! Matching is bidirectional: a candidate may be timestamped before or
//! after the frame image. This is a heuristic. Two unrelated clips created
//! inside the same window as one frame image can produce a false edge.

use std::cmp::Ordering;
use std::path::Path;

use super::graph::LineageGraph;
use crate::models::ClipRecord;
use crate::scan::Catalog;

/// Default matching window in seconds.
pub const DEFAULT_TIME_WINDOW_SECS: f64 = 30.0;

/// A possible predecessor for one clip.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    path: &'a Path,
    time: f64,
    delta: f64,
}

impl Candidate<'_> {
    /// Total order: closest first, then most recent, then lowest path.
    fn rank(&self, other: &Self) -> Ordering {
        self.delta
            .total_cmp(&other.delta)
            .then_with(|| other.time.total_cmp(&self.time))
            .then_with(|| self.path.cmp(other.path))
    }
}

/// Rebuild the full lineage graph from a catalog.
///
/// Output depends only on the catalog contents: clips are processed in
/// path order and candidates are ranked by a total order.
pub fn build_graph(catalog: &Catalog, window_secs: f64) -> LineageGraph {
    let mut graph = LineageGraph::default();

    for (clip_id, _) in catalog.clips() {
        let Some(frame) = catalog.seed_frame(clip_id) else {
            continue;
        };

        let mut candidates: Vec<Candidate<'_>> = catalog
            .clips()
            .filter(|(other, _)| *other != clip_id)
            .filter_map(|(other, record)| candidate(other, record, frame.time, window_secs))
            .collect();

        if candidates.is_empty() {
            tracing::debug!("{} is a root (no clip near its seed image)", clip_id.display());
            continue;
        }

        candidates.sort_by(Candidate::rank);
        let best = candidates[0];

        if let Some(runner_up) = candidates.get(1) {
            if runner_up.delta == best.delta {
                tracing::debug!(
                    "Ambiguous predecessor for {}: {} and {} both {:.3}s from seed, picked {}",
                    clip_id.display(),
                    best.path.display(),
                    runner_up.path.display(),
                    best.delta,
                    best.path.display()
                );
            }
        }

        graph.link(best.path, clip_id);
    }

    tracing::debug!("Built lineage graph with {} edges", graph.edge_count());
    graph
}

fn candidate<'a>(
    path: &'a Path,
    record: &ClipRecord,
    reference_time: f64,
    window_secs: f64,
) -> Option<Candidate<'a>> {
    let delta = (record.time - reference_time).abs();
    (delta < window_secs).then_some(Candidate {
        path,
        time: record.time,
        delta,
    })
}
