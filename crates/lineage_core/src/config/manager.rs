//! Config manager for loading, saving, and atomic updates.
//!
//! Key features:
//! - Atomic writes (write to temp file, then rename)
//! - Missing or corrupt files fall back to defaults
//! - Folder list kept resolved and free of duplicates

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::settings::Settings;

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Folder cannot be resolved: {path}: {source}")]
    InvalidFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid frame pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages application configuration.
///
/// Handles loading, saving, and the working-folder list.
pub struct ConfigManager {
    /// Path to the config file.
    config_path: PathBuf,
    /// Current settings loaded in memory.
    settings: Settings,
}

impl ConfigManager {
    /// Create a new config manager with the given config file path.
    ///
    /// Does not load the config - call `load()` or `load_or_default()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    /// Get the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get a reference to the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a mutable reference to the current settings.
    ///
    /// Note: Changes made here are only in memory until `save()` is called.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load config from file.
    ///
    /// Returns error if the file doesn't exist or is not valid JSON.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = serde_json::from_str(&content)?;
        Ok(())
    }

    /// Load config from file, using defaults if it is missing or corrupt.
    ///
    /// Never fails; problems are logged.
    pub fn load_or_default(&mut self) {
        match self.load() {
            Ok(()) => {
                tracing::debug!(
                    "Loaded config with {} folders from {}",
                    self.settings.folders.len(),
                    self.config_path.display()
                );
            }
            Err(ConfigError::NotFound(_)) => {
                tracing::debug!("No config at {}, using defaults", self.config_path.display());
                self.settings = Settings::default();
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {}: {}", self.config_path.display(), e);
                self.settings = Settings::default();
            }
        }
    }

    /// Add a working folder, stored resolved.
    ///
    /// Returns `false` if the folder was already configured.
    pub fn add_folder(&mut self, folder: impl AsRef<Path>) -> ConfigResult<bool> {
        let folder = folder.as_ref();
        let resolved = fs::canonicalize(folder).map_err(|source| ConfigError::InvalidFolder {
            path: folder.to_path_buf(),
            source,
        })?;

        if self.settings.folders.contains(&resolved) {
            return Ok(false);
        }
        self.settings.folders.push(resolved);
        Ok(true)
    }

    /// Remove a working folder.
    ///
    /// Matches either the stored path or its resolved form. Returns `false`
    /// if nothing was removed.
    pub fn remove_folder(&mut self, folder: impl AsRef<Path>) -> bool {
        let folder = folder.as_ref();
        let resolved = fs::canonicalize(folder).unwrap_or_else(|_| folder.to_path_buf());
        let before = self.settings.folders.len();
        self.settings
            .folders
            .retain(|f| f.as_path() != folder && *f != resolved);
        self.settings.folders.len() != before
    }

    /// Save the entire config atomically.
    ///
    /// Writes to a temp file first, then renames to ensure atomic write.
    pub fn save(&self) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(&self.settings)?;
        atomic_write(&self.config_path, &content)?;
        Ok(())
    }
}

/// Write content to a file atomically.
///
/// Writes to a `.tmp` sibling first, then renames over the target.
pub(crate) fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?; // Ensure data is flushed to disk
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}
