//! Core enums used throughout the application.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output fidelity for a concatenation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FidelityMode {
    /// Fast encode for quick review, lower quality.
    #[default]
    Preview,
    /// Slow encode at maximum quality, for keeping.
    Archival,
}

impl FidelityMode {
    /// x264 preset used for this mode.
    pub fn preset(&self) -> &'static str {
        match self {
            FidelityMode::Preview => "veryfast",
            FidelityMode::Archival => "veryslow",
        }
    }

    /// x264 constant rate factor used for this mode.
    pub fn crf(&self) -> u8 {
        match self {
            FidelityMode::Preview => 23,
            FidelityMode::Archival => 17,
        }
    }
}

impl std::fmt::Display for FidelityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FidelityMode::Preview => write!(f, "preview"),
            FidelityMode::Archival => write!(f, "archival"),
        }
    }
}

impl FromStr for FidelityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preview" | "fast" => Ok(FidelityMode::Preview),
            "archival" | "archive" | "hq" => Ok(FidelityMode::Archival),
            other => Err(format!("Unknown fidelity mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archival_is_slower_and_higher_quality() {
        assert!(FidelityMode::Archival.crf() < FidelityMode::Preview.crf());
        assert_eq!(FidelityMode::Archival.preset(), "veryslow");
        assert_eq!(FidelityMode::Preview.preset(), "veryfast");
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("Preview".parse::<FidelityMode>(), Ok(FidelityMode::Preview));
        assert_eq!("archival".parse::<FidelityMode>(), Ok(FidelityMode::Archival));
        assert!("lossless".parse::<FidelityMode>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&FidelityMode::Archival).unwrap();
        assert_eq!(json, "\"archival\"");
    }
}
