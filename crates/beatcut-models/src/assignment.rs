//! Slot assignments produced by the allocator.

use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::frames::frames_to_secs;

/// A committed (asset, start) pair for one cut. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub cut_index: u32,
    pub asset: AssetId,
    /// Frame-aligned offset into the canonical asset, in seconds
    pub start_time: f64,
    pub duration_frames: u32,
    /// Set when the slot was committed without the overlap guarantee
    pub degraded: bool,
}

impl Assignment {
    /// End of the consumed window in seconds.
    pub fn end_time(&self, fps: u32) -> f64 {
        self.start_time + frames_to_secs(self.duration_frames, fps)
    }
}

/// Why a cut fell back to a degraded slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// No overlap-free slot was found; the window may reuse footage.
    OverlapPermitted,
    /// No candidate asset is long enough to hold the whole cut; the clip
    /// will come out shorter than planned.
    SourceTooShort,
}

/// Non-fatal quality warning attached to a render result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationWarning {
    pub cut_index: u32,
    pub asset: AssetId,
    pub reason: DegradedReason,
}
