//! Beat-aligned cuts.

use serde::{Deserialize, Serialize};

use crate::frames::frames_to_secs;

/// A chronological segment of the final render with an exact frame count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    /// Index of the beat mark that opens this cut
    pub index: u32,
    /// Beat time in seconds
    pub start_time: f64,
    /// Number of output frames this cut occupies (always > 0)
    pub duration_frames: u32,
}

impl Cut {
    /// Cut length in seconds at `fps`.
    pub fn duration_secs(&self, fps: u32) -> f64 {
        frames_to_secs(self.duration_frames, fps)
    }
}
