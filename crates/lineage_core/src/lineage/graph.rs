//! Predecessor/successor graph over clips.

use std::collections::BTreeMap;
use std::path::Path;

use crate::models::ClipId;
use crate::scan::Catalog;

/// Directed lineage: "the last frame of A seeded B".
///
/// A clip has at most one predecessor. Clips without a predecessor are
/// roots. The graph is rebuilt wholesale from a [`Catalog`] and never
/// edited incrementally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageGraph {
    predecessor: BTreeMap<ClipId, ClipId>,
    successors: BTreeMap<ClipId, Vec<ClipId>>,
}

impl LineageGraph {
    /// Build the graph for a catalog with the given matching window.
    pub fn build(catalog: &Catalog, window_secs: f64) -> Self {
        super::matcher::build_graph(catalog, window_secs)
    }

    /// Record an edge `parent -> child`.
    ///
    /// Replaces any existing predecessor of `child`.
    pub fn link(&mut self, parent: &Path, child: &Path) {
        if let Some(old) = self.predecessor.insert(child.to_path_buf(), parent.to_path_buf()) {
            if let Some(list) = self.successors.get_mut(&old) {
                list.retain(|c| c != child);
                if list.is_empty() {
                    self.successors.remove(&old);
                }
            }
        }
        self.successors
            .entry(parent.to_path_buf())
            .or_default()
            .push(child.to_path_buf());
    }

    /// Predecessor of a clip, if any.
    pub fn predecessor(&self, clip: &Path) -> Option<&Path> {
        self.predecessor.get(clip).map(|p| p.as_path())
    }

    /// Direct successors of a clip, in insertion order.
    pub fn successors(&self, clip: &Path) -> &[ClipId] {
        self.successors.get(clip).map_or(&[], |v| v.as_slice())
    }

    /// Check if a clip has no predecessor.
    pub fn is_root(&self, clip: &Path) -> bool {
        !self.predecessor.contains_key(clip)
    }

    /// Roots among the catalog's clips, ordered by path.
    pub fn roots<'a>(&'a self, catalog: &'a Catalog) -> impl Iterator<Item = &'a Path> + 'a {
        catalog
            .clips()
            .map(|(id, _)| id)
            .filter(move |id| self.is_root(id))
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.predecessor.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relinking_moves_child_between_parents() {
        let mut graph = LineageGraph::default();
        graph.link(Path::new("/a.mp4"), Path::new("/c.mp4"));
        graph.link(Path::new("/b.mp4"), Path::new("/c.mp4"));

        assert_eq!(graph.predecessor(Path::new("/c.mp4")), Some(Path::new("/b.mp4")));
        assert!(graph.successors(Path::new("/a.mp4")).is_empty());
        assert_eq!(graph.successors(Path::new("/b.mp4")).len(), 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn unknown_clip_is_root_without_successors() {
        let graph = LineageGraph::default();
        assert!(graph.is_root(Path::new("/x.mp4")));
        assert!(graph.successors(Path::new("/x.mp4")).is_empty());
    }
}
