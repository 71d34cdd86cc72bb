//! Background execution of scans and encodes.
//!
//! Both operations block for a long time. These helpers run one unit of
//! work on a dedicated thread and hand the result to a callback, so the
//! caller's control loop stays responsive. There is no cancellation; join
//! the returned handle or wait for the callback before issuing a dependent
//! operation.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::concat::{ConcatPipeline, ConcatResult};
use crate::models::FidelityMode;
use crate::scan::{FolderScanner, LineageCache, ScanReport};

/// Cache shared between the scan worker and its readers.
pub type SharedCache = Arc<Mutex<LineageCache>>;

/// Run a scan on a worker thread.
///
/// The cache lock is held for the whole scan, so scans against the same
/// cache never overlap. `on_done` runs on the worker thread.
pub fn spawn_scan<F>(
    scanner: Arc<FolderScanner>,
    cache: SharedCache,
    folders: Vec<PathBuf>,
    on_done: F,
) -> io::Result<JoinHandle<()>>
where
    F: FnOnce(ScanReport) + Send + 'static,
{
    thread::Builder::new()
        .name("lineage-scan".to_string())
        .spawn(move || {
            let report = {
                let mut guard = cache.lock();
                scanner.scan(&folders, &mut guard)
            };
            on_done(report);
        })
}

/// Run a concatenation on a worker thread.
///
/// `on_done` receives the output path or the error and runs on the worker
/// thread.
pub fn spawn_concat<F>(
    pipeline: ConcatPipeline,
    clips: Vec<PathBuf>,
    mode: FidelityMode,
    output: Option<PathBuf>,
    on_done: F,
) -> io::Result<JoinHandle<()>>
where
    F: FnOnce(ConcatResult<PathBuf>) + Send + 'static,
{
    thread::Builder::new()
        .name("lineage-concat".to_string())
        .spawn(move || {
            let result = pipeline.run(&clips, mode, output.as_deref());
            if let Err(ref e) = result {
                tracing::error!("Concatenation failed: {}", e);
            }
            on_done(result);
        })
}
