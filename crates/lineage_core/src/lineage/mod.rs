//! Clip lineage: matching, graph and traversal.
//!
//! The graph is rebuilt from a [`Catalog`](crate::scan::Catalog) after every
//! scan and then queried read-only:
//!
//! - [`LineageGraph::build`] runs the time-proximity matcher
//! - [`LineageGraph::backward_chain`] walks ancestors, root first
//! - [`LineageGraph::forward_tree`] expands all descendants
//! - [`output_frame`] finds the frame image a clip produced
//!
//! # Example
//!
//! ```ignore
//! let catalog = cache.catalog();
//! let graph = LineageGraph::build(&catalog, DEFAULT_TIME_WINDOW_SECS);
//! for clip in graph.backward_chain(&clip_id)? {
//!     println!("{}", clip.display());
//! }
//! ```

mod graph;
mod lookup;
mod matcher;
mod traversal;

pub use graph::LineageGraph;
pub use lookup::{output_frame, DEFAULT_OUTPUT_FRAME_WINDOW_SECS};
pub use matcher::{build_graph, DEFAULT_TIME_WINDOW_SECS};
pub use traversal::{ForwardTree, TraversalError, TraversalResult};
