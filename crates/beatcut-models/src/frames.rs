//! Frame/time conversion helpers.
//!
//! All cut math is done in whole frames at a fixed rate so that clip
//! boundaries never drift against the backing track.

/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 30;

/// Absorbs binary-float artefacts such as `2.0 * 30.0 == 59.99999999`.
const FRAME_EPSILON: f64 = 1e-9;

/// Index of the frame that contains `seconds` (floor).
pub fn frame_floor(seconds: f64, fps: u32) -> i64 {
    (seconds * f64::from(fps) + FRAME_EPSILON).floor() as i64
}

/// Nearest frame index to `seconds`.
pub fn frame_round(seconds: f64, fps: u32) -> i64 {
    (seconds * f64::from(fps)).round() as i64
}

/// Duration of `frames` frames in seconds.
pub fn frames_to_secs(frames: u32, fps: u32) -> f64 {
    f64::from(frames) / f64::from(fps)
}

/// Align a time down to the nearest frame boundary.
pub fn align_to_frame(seconds: f64, fps: u32) -> f64 {
    if seconds <= 0.0 {
        return 0.0;
    }
    frame_floor(seconds, fps) as f64 / f64::from(fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_floor_absorbs_float_noise() {
        assert_eq!(frame_floor(2.0, 30), 60);
        assert_eq!(frame_floor(1.003, 30), 30);
        assert_eq!(frame_floor(0.7, 30), 21);
    }

    #[test]
    fn test_align_to_frame() {
        assert!((align_to_frame(1.05, 30) - 1.0333333).abs() < 1e-6);
        assert_eq!(align_to_frame(-0.2, 30), 0.0);
        assert!((align_to_frame(2.0, 30) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_frames_to_secs() {
        assert!((frames_to_secs(45, 30) - 1.5).abs() < 1e-9);
    }
}
