//! FFmpeg CLI wrapper for the beat-synced render pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - A runner with timeouts and a transcript of every issued command
//! - FFprobe-based probing
//! - Cover-crop geometry and all-intra transcode plans
//! - The `MediaBackend` collaborator trait and its FFmpeg implementation
//! - Atomic replacement of finished artifacts

pub mod backend;
pub mod command;
pub mod error;
pub mod ffmpeg_backend;
pub mod filters;
pub mod fs_utils;
pub mod plan;
pub mod probe;

pub use backend::{ClipWindow, MediaBackend};
pub use command::{check_ffmpeg, check_ffprobe, CommandLog, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use ffmpeg_backend::FfmpegBackend;
pub use fs_utils::replace_atomically;
pub use plan::{CoverCrop, EncoderStrategy, TranscodePlan};
pub use probe::{probe_video, VideoInfo};
