//! Source assets and per-asset usage tracking.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Position of a canonical asset in the job's asset list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub usize);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

/// A probed media file, either raw (as discovered) or canonical
/// (after normalization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

impl Asset {
    pub fn new(path: impl Into<PathBuf>, duration: f64, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            duration,
            width,
            height,
        }
    }

    /// File name for logging.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A time range already consumed from a canonical asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageInterval {
    pub start: f64,
    pub end: f64,
}

impl UsageInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Closed-interval intersection: touching endpoints count as overlap.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        start <= self.end && end >= self.start
    }
}
