//! Crate-level error type.
//!
//! Module errors fold into one taxonomy for callers that drive the whole
//! flow (see [`crate::session`]):
//!
//! - **Io**: inaccessible file or folder
//! - **Parse**: malformed cache, config or metadata document
//! - **Encode**: the concatenation failed
//! - **Structural**: the lineage graph is corrupt (predecessor cycle)
//! - **Config**: invalid configuration
//!
//! Ambiguous matches are not errors; the matcher logs them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::concat::ConcatError;
use crate::config::ConfigError;
use crate::lineage::TraversalError;
use crate::scan::CacheError;

/// Top-level error.
#[derive(Error, Debug)]
pub enum LineageError {
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Encoding failed: {0}")]
    Encode(#[from] ConcatError),

    #[error("Lineage graph is corrupt: {0}")]
    Structural(#[from] TraversalError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Clip is not in any scanned folder: {0}")]
    UnknownClip(PathBuf),
}

impl LineageError {
    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

impl From<CacheError> for LineageError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Io { path, source } => Self::Io {
                operation: format!("accessing cache {}", path.display()),
                source,
            },
            CacheError::Parse(source) => Self::Parse {
                what: "cache".to_string(),
                source,
            },
        }
    }
}

/// Result type using [`LineageError`].
pub type LineageResult<T> = Result<T, LineageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_errors_map_onto_taxonomy() {
        let io = CacheError::Io {
            path: PathBuf::from("/c.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(matches!(LineageError::from(io), LineageError::Io { .. }));

        let parse = CacheError::Parse(serde_json::from_str::<u8>("x").unwrap_err());
        let err = LineageError::from(parse);
        assert!(matches!(err, LineageError::Parse { .. }));
        assert!(err.to_string().starts_with("Failed to parse cache"));
    }

    #[test]
    fn cycle_is_structural() {
        let err: LineageError = TraversalError::Cycle {
            start: PathBuf::from("/a"),
            at: PathBuf::from("/b"),
        }
        .into();
        assert!(matches!(err, LineageError::Structural(_)));
    }
}
