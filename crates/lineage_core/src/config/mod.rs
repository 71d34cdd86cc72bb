//! Configuration management for Clip Lineage.
//!
//! This module provides:
//! - JSON configuration holding the working-folder list and tool settings
//! - Atomic file writes (write to temp, then rename)
//! - Fallback to defaults when the file is missing or corrupt
//!
//! # Example
//!
//! ```no_run
//! use lineage_core::config::ConfigManager;
//!
//! // Load config, falling back to defaults
//! let mut config = ConfigManager::new("timeline_config.json");
//! config.load_or_default();
//!
//! // Register a working folder and persist
//! config.add_folder("/data/renders").unwrap();
//! config.save().unwrap();
//! ```

mod manager;
mod settings;

pub(crate) use manager::atomic_write;
pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    EncoderSettings, LoggingSettings, MatchingSettings, PathSettings, ScanSettings, Settings,
};
