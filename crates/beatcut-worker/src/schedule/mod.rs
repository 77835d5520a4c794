//! Pure scheduling logic: no I/O, no external tools.

pub mod allocator;
pub mod beat_plan;

pub use allocator::{allocate_slots, AllocationPlan, AllocatorSettings};
pub use beat_plan::plan_cuts;
