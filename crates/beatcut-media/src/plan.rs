//! Transcode plans for canonical assets.
//!
//! Every source is brought to the target box with a "scale to cover, then
//! center-crop" policy and encoded all-intra, so later trims can stream-copy
//! on any frame boundary.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use beatcut_models::{EncoderConfig, TargetSpec};

use crate::command::FfmpegCommand;
use crate::probe::VideoInfo;

/// Explicit cover-crop geometry for a known source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverCrop {
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub crop_x: u32,
    pub crop_y: u32,
    pub width: u32,
    pub height: u32,
}

impl CoverCrop {
    /// Compute the geometry. `None` when the source size is unknown.
    pub fn compute(src_width: u32, src_height: u32, target: &TargetSpec) -> Option<Self> {
        if src_width == 0 || src_height == 0 || target.width == 0 || target.height == 0 {
            return None;
        }

        let scale = f64::max(
            f64::from(target.width) / f64::from(src_width),
            f64::from(target.height) / f64::from(src_height),
        );
        let scaled_width = cover_dimension(src_width, scale).max(even_up(target.width));
        let scaled_height = cover_dimension(src_height, scale).max(even_up(target.height));

        Some(Self {
            scaled_width,
            scaled_height,
            crop_x: (scaled_width - target.width) / 2,
            crop_y: (scaled_height - target.height) / 2,
            width: target.width,
            height: target.height,
        })
    }

    /// Filter chain fragment: explicit scale followed by the crop.
    pub fn to_filter(&self) -> String {
        format!(
            "scale={}:{}:flags=lanczos,crop={}:{}:{}:{}",
            self.scaled_width, self.scaled_height, self.width, self.height, self.crop_x, self.crop_y
        )
    }
}

/// Scaled size, rounded up, then up to the next even value.
fn cover_dimension(src: u32, scale: f64) -> u32 {
    // Epsilon keeps 1080 * (1920 / 1080) from landing on 1921
    let scaled = (f64::from(src) * scale - 1e-6).ceil().max(1.0) as u32;
    even_up(scaled)
}

fn even_up(v: u32) -> u32 {
    v + (v % 2)
}

/// Same cover-crop policy expressed for FFmpeg to resolve at runtime.
fn expression_filter(target: &TargetSpec) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase:force_divisible_by=2,crop={w}:{h}",
        w = target.width,
        h = target.height
    )
}

/// Which encoder path a job normalizes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderStrategy {
    /// NVENC, with software fallback per asset
    Hardware,
    Software,
}

impl fmt::Display for EncoderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderStrategy::Hardware => write!(f, "hardware"),
            EncoderStrategy::Software => write!(f, "software"),
        }
    }
}

/// Everything needed to transcode one asset into canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodePlan {
    pub strategy: EncoderStrategy,
    pub filter: String,
    pub encoder: EncoderConfig,
    pub target: TargetSpec,
    /// Explicit geometry, when the source size was known
    pub geometry: Option<CoverCrop>,
}

impl TranscodePlan {
    /// Software plan; always available.
    pub fn software(source: &VideoInfo, target: &TargetSpec) -> Self {
        let geometry = CoverCrop::compute(source.width, source.height, target);
        Self::build(EncoderStrategy::Software, geometry, EncoderConfig::software_intra(), target)
    }

    /// Hardware plan. Needs a known source size; `None` otherwise.
    pub fn hardware(source: &VideoInfo, target: &TargetSpec) -> Option<Self> {
        let geometry = CoverCrop::compute(source.width, source.height, target)?;
        Some(Self::build(
            EncoderStrategy::Hardware,
            Some(geometry),
            EncoderConfig::nvenc_intra(),
            target,
        ))
    }

    fn build(
        strategy: EncoderStrategy,
        geometry: Option<CoverCrop>,
        encoder: EncoderConfig,
        target: &TargetSpec,
    ) -> Self {
        let scale_crop = match &geometry {
            Some(g) => g.to_filter(),
            None => expression_filter(target),
        };
        let filter = format!(
            "fps={},{},format={},setsar=1",
            target.fps, scale_crop, target.pix_fmt
        );
        Self {
            strategy,
            filter,
            encoder,
            target: target.clone(),
            geometry,
        }
    }

    /// FFmpeg invocation for this plan.
    pub fn to_command(&self, input: &Path, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(input, output)
            .video_filter(self.filter.clone())
            .output_args(self.encoder.to_ffmpeg_args())
            .output_args([
                "-pix_fmt".to_string(),
                self.target.pix_fmt.clone(),
                "-r".to_string(),
                self.target.fps.to_string(),
            ])
            .no_audio()
            .output_args(["-movflags", "+faststart"])
    }
}
