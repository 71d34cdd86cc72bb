//! Lineage Core - Backend logic for Clip Lineage
//!
//! Reconstructs which generated clip seeded which, by correlating the
//! workflow embedded in each clip with the "last frame" images used to
//! start follow-on clips.
//!
//! This crate contains all business logic with zero UI dependencies.
//! It can be used by a GUI application or the CLI tool.

pub mod concat;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod lineage;
pub mod logging;
pub mod models;
pub mod scan;
pub mod session;
pub mod worker;

pub use errors::{LineageError, LineageResult};
pub use session::LineageSession;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
