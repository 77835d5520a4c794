//! Beat timeline to frame-exact cuts.
//!
//! Cut lengths are quantized cumulatively: each cut's absolute end time is
//! turned into a frame index and the cut spans from the running cursor to
//! that index. Rounding error therefore never accumulates, and the frame
//! counts always add up to the track length in frames.

use beatcut_models::frames::{frame_floor, frame_round};
use beatcut_models::{BeatTimeline, Cut};

/// Turn a timeline into chronological cuts, dropping those with no frames.
pub fn plan_cuts(timeline: &BeatTimeline, fps: u32) -> Vec<Cut> {
    let marks = timeline.marks();
    let total_frames = frame_round(timeline.total_duration(), fps).max(0);

    let mut cuts = Vec::with_capacity(marks.len());
    let mut cursor: i64 = 0;

    for (i, mark) in marks.iter().enumerate() {
        let end_frame = match marks.get(i + 1) {
            Some(next) => frame_floor(next.time, fps).clamp(cursor, total_frames),
            None => total_frames,
        };

        let duration_frames = end_frame - cursor;
        cursor = cursor.max(end_frame);

        if duration_frames <= 0 {
            continue;
        }

        cuts.push(Cut {
            index: mark.index,
            start_time: mark.time,
            duration_frames: duration_frames as u32,
        });
    }

    cuts
}

/// Sum of all cut lengths in frames.
pub fn total_frames(cuts: &[Cut]) -> u64 {
    cuts.iter().map(|c| u64::from(c.duration_frames)).sum()
}
