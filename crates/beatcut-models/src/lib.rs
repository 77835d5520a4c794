//! Shared data models for the beat-synced render pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Beat timelines and the cuts derived from them
//! - Source and canonical assets, usage intervals
//! - Slot assignments produced by the allocator
//! - Target output spec and encoder configuration

pub mod asset;
pub mod assignment;
pub mod beat;
pub mod cut;
pub mod encoding;
pub mod frames;

// Re-export common types
pub use asset::{Asset, AssetId, UsageInterval};
pub use assignment::{AllocationWarning, Assignment, DegradedReason};
pub use beat::{BeatMark, BeatTimeline, TimelineError, TimelineResult};
pub use cut::Cut;
pub use encoding::{EncoderConfig, TargetSpec};
