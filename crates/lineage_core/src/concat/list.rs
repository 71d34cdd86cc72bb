//! Concat-demuxer list files.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Escape a path for a single-quoted concat-list entry.
///
/// Every `'` becomes `'\''` (close quote, escaped quote, reopen).
pub fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

/// Render list content: one `file '<path>'` line per clip, in order.
pub fn render_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| format!("file '{}'\n", escape_path(clip)))
        .collect()
}

/// Write the list to a temp file in `dir`.
///
/// The file is removed when the returned handle is dropped.
pub fn write_list(clips: &[PathBuf], dir: &Path) -> io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("concat_")
        .suffix(".txt")
        .tempfile_in(dir)?;
    file.write_all(render_list(clips).as_bytes())?;
    file.flush()?;
    Ok(file)
}
