//! Output target and video encoding configuration.

use serde::{Deserialize, Serialize};

use crate::frames::DEFAULT_FPS;

/// Portrait output resolution
pub const OUTPUT_WIDTH: u32 = 1080;
pub const OUTPUT_HEIGHT: u32 = 1920;
/// Canonical pixel format
pub const DEFAULT_PIX_FMT: &str = "yuv420p";

/// Default software codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// NVENC hardware codec
pub const NVENC_VIDEO_CODEC: &str = "h264_nvenc";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// NVENC preset of comparable speed
pub const NVENC_PRESET: &str = "p4";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Default audio codec for the final mux
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default audio bitrate for the final mux
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

/// Canonical resolution/frame-rate/pixel-format every asset is normalized to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
}

fn default_width() -> u32 {
    OUTPUT_WIDTH
}
fn default_height() -> u32 {
    OUTPUT_HEIGHT
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_pix_fmt() -> String {
    DEFAULT_PIX_FMT.to_string()
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            width: OUTPUT_WIDTH,
            height: OUTPUT_HEIGHT,
            fps: DEFAULT_FPS,
            pix_fmt: DEFAULT_PIX_FMT.to_string(),
        }
    }
}

/// Video encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Video codec (e.g., "libx264", "h264_nvenc")
    pub codec: String,
    pub preset: String,
    /// Quality (CRF for x264, CQ for NVENC)
    pub crf: u8,
    pub use_nvenc: bool,
    /// Emit a keyframe on every frame
    pub all_intra: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            use_nvenc: false,
            all_intra: false,
        }
    }
}

impl EncoderConfig {
    /// Software encoder for canonical (all-intra) assets.
    pub fn software_intra() -> Self {
        Self {
            all_intra: true,
            ..Default::default()
        }
    }

    /// NVENC encoder for canonical (all-intra) assets.
    pub fn nvenc_intra() -> Self {
        Self::software_intra().with_nvenc()
    }

    /// Switch to NVENC hardware encoding.
    pub fn with_nvenc(mut self) -> Self {
        self.use_nvenc = true;
        self.codec = NVENC_VIDEO_CODEC.to_string();
        self.preset = NVENC_PRESET.to_string();
        self
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
        ];

        // NVENC has no CRF, it takes -cq
        let quality_flag = if self.use_nvenc { "-cq" } else { "-crf" };
        args.extend([quality_flag.to_string(), self.crf.to_string()]);

        if self.all_intra {
            args.extend(
                ["-g", "1", "-keyint_min", "1", "-bf", "0"]
                    .iter()
                    .map(|s| s.to_string()),
            );
            if !self.use_nvenc {
                args.extend(["-sc_threshold".to_string(), "0".to_string()]);
            }
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target() {
        let target = TargetSpec::default();
        assert_eq!((target.width, target.height, target.fps), (1080, 1920, 30));
        assert_eq!(target.pix_fmt, "yuv420p");
    }

    #[test]
    fn test_software_intra_args() {
        let args = EncoderConfig::software_intra().to_ffmpeg_args();
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"-crf".to_string()));
        let g = args.iter().position(|a| a == "-g").unwrap();
        assert_eq!(args[g + 1], "1");
        assert!(args.contains(&"-sc_threshold".to_string()));
    }

    #[test]
    fn test_nvenc_args() {
        let args = EncoderConfig::nvenc_intra().to_ffmpeg_args();
        assert!(args.contains(&"h264_nvenc".to_string()));
        assert!(args.contains(&"-cq".to_string()));
        assert!(!args.contains(&"-crf".to_string()));
        assert!(args.contains(&"-g".to_string()));
    }

    #[test]
    fn test_target_deserialize_defaults() {
        let target: TargetSpec = serde_json::from_str(r#"{"fps": 25}"#).unwrap();
        assert_eq!(target.fps, 25);
        assert_eq!(target.width, OUTPUT_WIDTH);
    }
}
