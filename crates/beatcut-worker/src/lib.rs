//! Beat-synced render worker.
//!
//! This crate provides:
//! - Beat timeline to frame-exact cut planning
//! - Asset discovery, probing and normalization
//! - Randomized, overlap-aware slot allocation with explicit fallback
//! - Clip extraction and final assembly (concat, mux, outro)
//! - The render job with scoped scratch space and a command transcript

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod normalizer;
pub mod render_job;
pub mod retry;
pub mod schedule;
pub mod scratch;

pub use config::RenderConfig;
pub use error::{RenderError, RenderErrorKind, RenderResult};
pub use logging::RenderLogger;
pub use render_job::{BeatSyncRenderer, RenderOutcome};
pub use schedule::{allocate_slots, plan_cuts, AllocationPlan, AllocatorSettings};
