//! End-to-end session: config, cache, graph and queries.
//!
//! A [`LineageSession`] owns the configuration, the persisted cache, and
//! the graph derived from the last scan. Front ends drive everything
//! through it:
//!
//! 1. [`LineageSession::open`] loads config and cache (missing or corrupt
//!    files fall back to empty defaults)
//! 2. [`LineageSession::scan`] updates the cache, rebuilds the graph, then
//!    saves the cache
//! 3. Queries resolve a clip path and answer from the current graph
//!
//! # Example
//!
//! ```ignore
//! let mut session = LineageSession::open("timeline_config.json")?;
//! session.scan()?;
//! let chain = session.chain(Path::new("/renders/clip_0042.mp4"))?;
//! let combined = session.concat(&chain, FidelityMode::Preview, None)?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::concat::ConcatPipeline;
use crate::config::{ConfigError, ConfigManager, ScanSettings, Settings};
use crate::errors::{LineageError, LineageResult};
use crate::extraction::FfprobeExtractor;
use crate::lineage::{output_frame, ForwardTree, LineageGraph};
use crate::models::{ClipId, FidelityMode, FrameImageRecord};
use crate::scan::{Catalog, FolderScanner, LineageCache, ScanOptions, ScanReport};

/// Config, cache and derived graph for one working set of folders.
pub struct LineageSession {
    config: ConfigManager,
    cache: LineageCache,
    catalog: Catalog,
    graph: LineageGraph,
}

impl LineageSession {
    /// Load config and cache.
    pub fn open(config_path: impl Into<PathBuf>) -> LineageResult<Self> {
        let mut config = ConfigManager::new(config_path);
        config.load_or_default();
        Self::from_config(config)
    }

    /// Build a session from an already loaded config.
    ///
    /// An uncompilable frame pattern is replaced by the default one.
    pub fn from_config(mut config: ConfigManager) -> LineageResult<Self> {
        if let Err(e) = ScanOptions::from_settings(&config.settings().scan) {
            tracing::warn!(
                "Invalid frame pattern in {}, using default: {}",
                config.path().display(),
                e
            );
            config.settings_mut().scan.frame_pattern = ScanSettings::default().frame_pattern;
        }

        let cache = LineageCache::load_or_default(&cache_path(&config));
        let mut session = Self {
            config,
            cache,
            catalog: Catalog::default(),
            graph: LineageGraph::default(),
        };
        session.rebuild();
        Ok(session)
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        self.config.settings()
    }

    /// Config manager, for folder edits.
    pub fn config_mut(&mut self) -> &mut ConfigManager {
        &mut self.config
    }

    /// Save the config.
    pub fn save_config(&self) -> LineageResult<()> {
        Ok(self.config.save()?)
    }

    /// Location of the cache file.
    pub fn cache_path(&self) -> PathBuf {
        cache_path(&self.config)
    }

    /// Merged view of the last scan.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Graph derived from the last scan.
    pub fn graph(&self) -> &LineageGraph {
        &self.graph
    }

    /// Scan configured folders, rebuild the graph and save the cache.
    ///
    /// A cache that cannot be saved is reported in
    /// [`ScanReport::cache_error`]; the scan itself still succeeds.
    pub fn scan(&mut self) -> LineageResult<ScanReport> {
        let settings = self.config.settings();
        let options = ScanOptions::from_settings(&settings.scan).map_err(ConfigError::from)?;
        let extractor = FfprobeExtractor::new(
            settings.encoder.ffprobe_path.clone(),
            options.frame_pattern().clone(),
        );
        let scanner = FolderScanner::new(Box::new(extractor), options);

        let mut report = scanner.scan(&settings.folders, &mut self.cache);
        self.rebuild();

        // The in-memory results stay usable when the cache cannot be written
        if let Err(e) = self.cache.save(&self.cache_path()) {
            let err = LineageError::from(e);
            tracing::warn!("Scan results not persisted: {}", err);
            report.cache_error = Some(err.to_string());
        }
        Ok(report)
    }

    /// Resolve a user-supplied path to a known clip.
    pub fn resolve_clip(&self, path: &Path) -> LineageResult<ClipId> {
        let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.catalog.contains_clip(&resolved) {
            Ok(resolved)
        } else {
            Err(LineageError::UnknownClip(path.to_path_buf()))
        }
    }

    /// Ancestors of a clip, root first.
    pub fn chain(&self, clip: &Path) -> LineageResult<Vec<ClipId>> {
        let id = self.resolve_clip(clip)?;
        Ok(self.graph.backward_chain(&id)?)
    }

    /// Descendants of a clip.
    pub fn tree(&self, clip: &Path) -> LineageResult<ForwardTree> {
        let id = self.resolve_clip(clip)?;
        Ok(self.graph.forward_tree(&id))
    }

    /// Prompt text of a clip's workflow.
    pub fn prompt(&self, clip: &Path) -> LineageResult<Option<String>> {
        let id = self.resolve_clip(clip)?;
        Ok(self
            .catalog
            .clip(&id)
            .and_then(|record| record.workflow.as_ref())
            .and_then(|workflow| workflow.prompt_text()))
    }

    /// Frame image a clip produced.
    pub fn output_frame(&self, clip: &Path) -> LineageResult<Option<&FrameImageRecord>> {
        let id = self.resolve_clip(clip)?;
        let window = self.settings().matching.output_frame_window_secs;
        Ok(output_frame(&self.catalog, &self.graph, &id, window))
    }

    /// Concatenate clips with the configured encoder.
    pub fn concat(
        &self,
        clips: &[PathBuf],
        mode: FidelityMode,
        output: Option<&Path>,
    ) -> LineageResult<PathBuf> {
        let pipeline = ConcatPipeline::new(&self.settings().encoder);
        Ok(pipeline.run(clips, mode, output)?)
    }

    fn rebuild(&mut self) {
        self.catalog = self.cache.catalog();
        let window = self.config.settings().matching.time_window_secs;
        self.graph = LineageGraph::build(&self.catalog, window);
    }
}

/// Cache file path; relative paths are taken from the config's folder.
fn cache_path(config: &ConfigManager) -> PathBuf {
    let cache_file = &config.settings().paths.cache_file;
    if cache_file.is_absolute() {
        return cache_file.clone();
    }
    match config.path().parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(cache_file),
        _ => cache_file.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClipRecord, Workflow};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn cache_path_is_relative_to_config() {
        let manager = ConfigManager::new("/etc/lineage/timeline_config.json");
        assert_eq!(
            cache_path(&manager),
            PathBuf::from("/etc/lineage/timeline_cache.json")
        );
    }

    #[test]
    fn invalid_frame_pattern_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"folders": [], "scan": {"frame_pattern": "(["}}"#).unwrap();

        let mut session = LineageSession::open(&config_path).unwrap();
        assert_eq!(
            session.settings().scan.frame_pattern,
            ScanSettings::default().frame_pattern
        );

        // Folder edits still work so the config can be repaired
        let renders = dir.path().join("renders");
        fs::create_dir(&renders).unwrap();
        assert!(session.config_mut().add_folder(&renders).unwrap());
        session.save_config().unwrap();
        assert!(session.scan().is_ok());
    }

    #[test]
    fn unsaved_cache_still_rebuilds_graph() {
        let dir = tempdir().unwrap();
        let renders = dir.path().join("renders");
        fs::create_dir(&renders).unwrap();
        fs::write(renders.join("clip.mp4"), b"x").unwrap();
        // A regular file where the cache folder should be
        fs::write(dir.path().join("blocker"), b"x").unwrap();

        let mut session = LineageSession::open(dir.path().join("config.json")).unwrap();
        session.config_mut().add_folder(&renders).unwrap();
        let settings = session.config_mut().settings_mut();
        settings.encoder.ffprobe_path = "/nonexistent/ffprobe".to_string();
        settings.paths.cache_file = dir.path().join("blocker").join("cache.json");

        let report = session.scan().unwrap();
        assert_eq!(report.clips, 1);
        assert!(report.cache_error.is_some());
        assert_eq!(session.catalog().clip_count(), 1);
        assert_eq!(session.chain(&renders.join("clip.mp4")).unwrap().len(), 1);
    }

    #[test]
    fn scan_saves_cache_and_answers_queries() {
        let dir = tempdir().unwrap();
        let renders = dir.path().join("renders");
        fs::create_dir(&renders).unwrap();
        fs::write(renders.join("clip.mp4"), b"x").unwrap();

        let mut session = LineageSession::open(dir.path().join("config.json")).unwrap();
        session.config_mut().add_folder(&renders).unwrap();
        session.config_mut().settings_mut().encoder.ffprobe_path =
            "/nonexistent/ffprobe".to_string();

        let report = session.scan().unwrap();
        assert_eq!(report.clips, 1);
        assert!(session.cache_path().exists());

        let chain = session.chain(&renders.join("clip.mp4")).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(session.prompt(&renders.join("clip.mp4")).unwrap(), None);
        assert!(matches!(
            session.chain(&renders.join("missing.mp4")),
            Err(LineageError::UnknownClip(_))
        ));
    }

    #[test]
    fn prompt_comes_from_cached_workflow() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let workflow: Workflow = serde_json::from_value(serde_json::json!({
            "6": {"class_type": "CLIPTextEncode", "inputs": {"text": "a heron at dusk"}}
        }))
        .unwrap();

        let mut cache = LineageCache::new();
        cache.folder_entry(dir.path()).clips = BTreeMap::from([(
            dir.path().join("c.mp4"),
            ClipRecord::new(1.0, 1.0).with_workflow(workflow),
        )]);
        cache.save(&dir.path().join("timeline_cache.json")).unwrap();

        let session = LineageSession::open(&config_path).unwrap();
        assert_eq!(
            session.prompt(&dir.path().join("c.mp4")).unwrap().as_deref(),
            Some("a heron at dusk")
        );
    }
}
