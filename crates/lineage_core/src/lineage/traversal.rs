//! Backward-chain and forward-tree queries.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::graph::LineageGraph;
use crate::models::ClipId;

/// Errors from graph traversal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraversalError {
    /// The predecessor relation loops back on itself.
    #[error("Predecessor cycle detected at {at} while walking back from {start}")]
    Cycle { start: PathBuf, at: PathBuf },
}

/// Result type for traversal queries.
pub type TraversalResult<T> = Result<T, TraversalError>;

/// Forward tree: every reachable clip mapped to its direct successors.
pub type ForwardTree = BTreeMap<ClipId, Vec<ClipId>>;

impl LineageGraph {
    /// Ancestors of `clip`, root first and `clip` last.
    ///
    /// Fails with [`TraversalError::Cycle`] if a clip is visited twice.
    pub fn backward_chain(&self, clip: &Path) -> TraversalResult<Vec<ClipId>> {
        let mut chain = vec![clip.to_path_buf()];
        let mut seen: BTreeSet<&Path> = BTreeSet::from([clip]);

        let mut current = clip;
        while let Some(parent) = self.predecessor(current) {
            if !seen.insert(parent) {
                return Err(TraversalError::Cycle {
                    start: clip.to_path_buf(),
                    at: parent.to_path_buf(),
                });
            }
            chain.push(parent.to_path_buf());
            current = parent;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Descendants of `clip`, each mapped to its direct successors.
    ///
    /// Includes `clip` itself. Each clip is expanded once, so a corrupted
    /// graph cannot recurse without bound.
    pub fn forward_tree(&self, clip: &Path) -> ForwardTree {
        let mut tree = ForwardTree::new();
        let mut stack = vec![clip];

        while let Some(node) = stack.pop() {
            if tree.contains_key(node) {
                continue;
            }
            let successors = self.successors(node);
            tree.insert(node.to_path_buf(), successors.to_vec());
            stack.extend(successors.iter().rev().map(|s| s.as_path()));
        }

        tree
    }
}
