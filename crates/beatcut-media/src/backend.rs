//! The external media tool contract.
//!
//! Orchestration code only ever talks to footage through this trait, which
//! keeps the scheduling logic free of process handling and lets the
//! pipeline run against a fake in tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use beatcut_models::{EncoderConfig, TargetSpec};

use crate::error::MediaResult;
use crate::plan::TranscodePlan;
use crate::probe::VideoInfo;

/// Frame-exact window to copy out of a canonical asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipWindow {
    /// Frame-aligned start in seconds
    pub start: f64,
    pub frames: u32,
    pub fps: u32,
}

/// Synchronous-per-call media collaborator: probe, transcode, trim, join.
///
/// Each call returns only once the underlying tool has exited; a failure
/// carries the tool's captured diagnostics.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Verify the required tools exist before a job starts.
    async fn check_available(&self) -> MediaResult<()>;

    /// Whether the named encoder can be used.
    async fn supports_encoder(&self, encoder: &str) -> bool;

    /// Duration and dimensions of a media file.
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;

    /// Transcode `input` to canonical form at `output`.
    async fn transcode(&self, input: &Path, output: &Path, plan: &TranscodePlan) -> MediaResult<()>;

    /// Stream-copy `window` out of a canonical asset.
    async fn extract(&self, input: &Path, output: &Path, window: &ClipWindow) -> MediaResult<()>;

    /// Join clips in order with the concat demuxer (no re-encode).
    async fn concat(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()>;

    /// Mux the backing track onto `video`, stopping at the shorter stream.
    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()>;

    /// Append an outro through a filter-graph concat.
    async fn append_outro(
        &self,
        main: &Path,
        outro: &Path,
        output: &Path,
        target: &TargetSpec,
        encoder: &EncoderConfig,
    ) -> MediaResult<()>;

    /// Every command issued so far, in order.
    fn command_transcript(&self) -> Vec<String> {
        Vec::new()
    }
}
