//! Data models for Clip Lineage.
//!
//! This module contains the core data structures shared by the scanner,
//! matcher and concatenation pipeline:
//! - Clip and frame-image records as stored in the cache
//! - The typed workflow document embedded in each clip
//! - Enums for encode fidelity

mod enums;
mod records;
mod workflow;

// Re-export all public types
pub use enums::FidelityMode;
pub use records::{ClipId, ClipRecord, FrameImageRecord};
pub use workflow::{NodeKind, Workflow, WorkflowNode};
