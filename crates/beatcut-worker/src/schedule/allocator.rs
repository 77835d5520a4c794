//! Slot allocation: which canonical asset, and where in it, feeds each cut.
//!
//! Cuts are processed in order. For every cut the allocator shuffles the
//! candidate assets (all of them, minus the one used for the previous cut
//! when there is a choice) and tries a bounded number of random,
//! frame-aligned offsets per asset, accepting the first window that does
//! not touch any window already taken from that asset. When nothing fits
//! it falls back to an overlapping slot and flags the assignment degraded.
//!
//! Usage is kept as a plain list per asset; a linear scan is fine for tens
//! of cuts over a handful of assets. An interval tree would only pay off
//! well beyond that.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use beatcut_models::frames::align_to_frame;
use beatcut_models::{
    AllocationWarning, Asset, AssetId, Assignment, Cut, DegradedReason, UsageInterval,
};

use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};

/// Tunables for the slot search.
#[derive(Debug, Clone)]
pub struct AllocatorSettings {
    pub fps: u32,
    /// Seconds kept free at the end of every asset
    pub guard_margin_secs: f64,
    /// Random draws per candidate asset
    pub attempts_per_asset: u32,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        Self {
            fps: beatcut_models::frames::DEFAULT_FPS,
            guard_margin_secs: 0.1,
            attempts_per_asset: 10,
        }
    }
}

impl AllocatorSettings {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            fps: config.target.fps,
            guard_margin_secs: config.guard_margin_secs,
            attempts_per_asset: config.attempts_per_asset,
        }
    }
}

/// Result of allocating every cut of a job.
#[derive(Debug, Clone, Default)]
pub struct AllocationPlan {
    /// One per cut, in cut order
    pub assignments: Vec<Assignment>,
    pub warnings: Vec<AllocationWarning>,
    /// Windows taken from each asset, indexed by `AssetId`
    pub usage: Vec<Vec<UsageInterval>>,
}

impl AllocationPlan {
    pub fn degraded_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.degraded).count()
    }
}

/// Allocation state threaded from one cut to the next.
struct SlotAllocator<'a> {
    assets: &'a [Asset],
    settings: &'a AllocatorSettings,
    usage: Vec<Vec<UsageInterval>>,
    previous: Option<AssetId>,
}

impl<'a> SlotAllocator<'a> {
    fn new(assets: &'a [Asset], settings: &'a AllocatorSettings) -> Self {
        Self {
            assets,
            settings,
            usage: vec![Vec::new(); assets.len()],
            previous: None,
        }
    }

    fn duration(&self, id: AssetId) -> f64 {
        let d = self.assets[id.0].duration;
        if d.is_finite() {
            d.max(0.0)
        } else {
            0.0
        }
    }

    /// Latest start that keeps the window clear of the guard margin.
    fn max_start(&self, id: AssetId, cut_secs: f64) -> f64 {
        self.duration(id) - cut_secs - self.settings.guard_margin_secs
    }

    fn is_free(&self, id: AssetId, start: f64, end: f64) -> bool {
        !self.usage[id.0].iter().any(|u| u.overlaps(start, end))
    }

    fn candidates(&self) -> Vec<AssetId> {
        let mut ids: Vec<AssetId> = (0..self.assets.len()).map(AssetId).collect();
        // Variety only applies when there is something else to pick
        if ids.len() > 1 {
            if let Some(previous) = self.previous {
                ids.retain(|id| *id != previous);
            }
        }
        ids
    }

    fn assign<R: Rng>(&mut self, cut: &Cut, rng: &mut R) -> (Assignment, Option<AllocationWarning>) {
        let fps = self.settings.fps;
        let cut_secs = cut.duration_secs(fps);

        let mut candidates = self.candidates();
        candidates.shuffle(rng);

        for &id in &candidates {
            let max_start = self.max_start(id, cut_secs);
            if max_start <= 0.0 {
                continue;
            }
            for _ in 0..self.settings.attempts_per_asset {
                let start = align_to_frame(rng.random_range(0.0..=max_start), fps);
                if self.is_free(id, start, start + cut_secs) {
                    return (self.commit(cut, id, start, false), None);
                }
            }
        }

        let (id, reason) = self.fallback_asset(&candidates, cut_secs, rng);
        let ceiling = self.max_start(id, cut_secs).max(0.0);
        let start = if ceiling > 0.0 {
            align_to_frame(rng.random_range(0.0..=ceiling), fps)
        } else {
            0.0
        };

        tracing::warn!(
            cut = cut.index,
            asset = %self.assets[id.0].display_name(),
            start = start,
            reason = ?reason,
            "No free slot found, committing degraded assignment"
        );

        let assignment = self.commit(cut, id, start, true);
        let warning = AllocationWarning {
            cut_index: cut.index,
            asset: id,
            reason,
        };
        (assignment, Some(warning))
    }

    /// Pick where a cut goes when no overlap-free window exists.
    ///
    /// Stays within `candidates`, so the previous cut's asset is never
    /// reused while another exists. Candidates too short to hold the whole
    /// cut are passed over in favour of any that can; only when none can
    /// does the cut get a short source.
    fn fallback_asset<R: Rng>(
        &self,
        candidates: &[AssetId],
        cut_secs: f64,
        rng: &mut R,
    ) -> (AssetId, DegradedReason) {
        let hosts: Vec<AssetId> = candidates
            .iter()
            .filter(|id| self.duration(**id) >= cut_secs)
            .copied()
            .collect();
        if let Some(id) = hosts.choose(rng) {
            return (*id, DegradedReason::OverlapPermitted);
        }

        let id = candidates.choose(rng).copied().unwrap_or(AssetId(0));
        (id, DegradedReason::SourceTooShort)
    }

    fn commit(&mut self, cut: &Cut, id: AssetId, start: f64, degraded: bool) -> Assignment {
        let end = start + cut.duration_secs(self.settings.fps);
        self.usage[id.0].push(UsageInterval::new(start, end));
        self.previous = Some(id);
        Assignment {
            cut_index: cut.index,
            asset: id,
            start_time: start,
            duration_frames: cut.duration_frames,
            degraded,
        }
    }
}

/// Assign every cut to a (canonical asset, start) pair.
///
/// Deterministic for a given `rng` state, so seeded runs are repeatable.
pub fn allocate_slots<R: Rng>(
    cuts: &[Cut],
    assets: &[Asset],
    settings: &AllocatorSettings,
    rng: &mut R,
) -> RenderResult<AllocationPlan> {
    if assets.is_empty() {
        return Err(RenderError::config("No canonical assets to allocate from"));
    }

    let mut allocator = SlotAllocator::new(assets, settings);
    let mut assignments = Vec::with_capacity(cuts.len());
    let mut warnings = Vec::new();

    for cut in cuts {
        let (assignment, warning) = allocator.assign(cut, rng);
        assignments.push(assignment);
        warnings.extend(warning);
    }

    Ok(AllocationPlan {
        assignments,
        warnings,
        usage: allocator.usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FPS: u32 = 30;

    fn assets(durations: &[f64]) -> Vec<Asset> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| Asset::new(format!("/scratch/canonical_{}.mp4", i), *d, 1080, 1920))
            .collect()
    }

    fn cuts(frames: &[u32]) -> Vec<Cut> {
        let mut start = 0.0;
        frames
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let cut = Cut {
                    index: i as u32,
                    start_time: start,
                    duration_frames: *f,
                };
                start += f64::from(*f) / f64::from(FPS);
                cut
            })
            .collect()
    }

    fn run(cut_frames: &[u32], durations: &[f64], seed: u64) -> AllocationPlan {
        let mut rng = StdRng::seed_from_u64(seed);
        allocate_slots(
            &cuts(cut_frames),
            &assets(durations),
            &AllocatorSettings::default(),
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_non_degraded_windows_never_overlap() {
        for seed in 0..200 {
            let plan = run(&[30, 45, 20, 60, 33, 41, 28, 50, 30, 30], &[8.0, 12.0, 6.5], seed);
            for (asset, _) in plan.usage.iter().enumerate() {
                let windows: Vec<&Assignment> = plan
                    .assignments
                    .iter()
                    .filter(|a| a.asset == AssetId(asset) && !a.degraded)
                    .collect();
                for (i, a) in windows.iter().enumerate() {
                    for b in &windows[i + 1..] {
                        let overlap =
                            a.start_time <= b.end_time(FPS) && a.end_time(FPS) >= b.start_time;
                        assert!(!overlap, "seed {}: {:?} overlaps {:?}", seed, a, b);
                    }
                }
            }
        }
    }

    #[test]
    fn test_consecutive_cuts_use_different_assets() {
        for seed in 0..200 {
            let plan = run(&[30; 12], &[20.0, 20.0, 20.0], seed);
            for pair in plan.assignments.windows(2) {
                assert_ne!(pair[0].asset, pair[1].asset, "seed {}", seed);
            }
        }
    }

    #[test]
    fn test_single_asset_still_allocates_every_cut() {
        let plan = run(&[30; 6], &[60.0], 7);
        assert_eq!(plan.assignments.len(), 6);
        assert!(plan.assignments.iter().all(|a| a.asset == AssetId(0)));
        assert_eq!(plan.usage[0].len(), 6);
    }

    #[test]
    fn test_short_asset_is_never_chosen_when_it_cannot_host() {
        for seed in 0..100 {
            let plan = run(&[60], &[1.5, 5.0], seed);
            let a = &plan.assignments[0];
            assert_eq!(a.asset, AssetId(1), "seed {}", seed);
            assert!(!a.degraded);
            assert!(a.end_time(FPS) <= 5.0 - 0.1 + 1e-9);
        }
    }

    #[test]
    fn test_total_exhaustion_degrades_without_failing() {
        for seed in 0..50 {
            let plan = run(&[90], &[1.0, 1.5], seed);
            let a = &plan.assignments[0];
            assert!(a.degraded);
            let duration = [1.0, 1.5][a.asset.0];
            assert!(a.start_time >= 0.0 && a.start_time <= duration);
            assert_eq!(plan.warnings.len(), 1);
            assert_eq!(plan.warnings[0].reason, DegradedReason::SourceTooShort);
        }
    }

    #[test]
    fn test_overlap_fallback_is_recorded() {
        let plan = run(&[60, 60, 60], &[2.3], 11);
        assert!(!plan.assignments[0].degraded);
        assert!(plan.assignments[1].degraded);
        assert!(plan.assignments[2].degraded);
        assert!(plan
            .warnings
            .iter()
            .all(|w| w.reason == DegradedReason::OverlapPermitted));
        for a in &plan.assignments {
            assert!(a.start_time >= 0.0 && a.start_time <= 0.2 + 1e-9);
        }
        // Degraded windows still count as used
        assert_eq!(plan.usage[0].len(), 3);
        assert_eq!(plan.degraded_count(), 2);
    }

    #[test]
    fn test_fallback_prefers_a_candidate_that_fits() {
        // Asset 0 is full after the first cut; asset 1 is too short, asset 2 fits
        for seed in 0..50 {
            let plan = run(&[60, 60, 60], &[2.3, 1.0, 4.5], seed);
            for pair in plan.assignments.windows(2) {
                assert_ne!(pair[0].asset, pair[1].asset, "seed {}", seed);
            }
            for w in &plan.warnings {
                assert_ne!(w.asset, AssetId(1), "seed {}", seed);
            }
        }
    }

    #[test]
    fn test_fallback_never_reuses_previous_asset() {
        // Only asset 0 can hold 2s; the second cut must still move elsewhere
        for seed in 0..50 {
            let plan = run(&[60, 60], &[2.3, 1.0, 1.0], seed);
            let (first, second) = (&plan.assignments[0], &plan.assignments[1]);
            assert_eq!(first.asset, AssetId(0));
            assert!(!first.degraded);
            assert!(second.degraded);
            assert_ne!(second.asset, first.asset, "seed {}", seed);
            assert_eq!(second.start_time, 0.0);
            assert_eq!(plan.warnings[0].reason, DegradedReason::SourceTooShort);
        }
    }

    #[test]
    fn test_starts_are_frame_aligned() {
        let plan = run(&[17, 23, 41, 29], &[30.0, 25.0], 3);
        for a in &plan.assignments {
            let frames = a.start_time * f64::from(FPS);
            assert!((frames - frames.round()).abs() < 1e-6, "{} not aligned", a.start_time);
        }
    }

    #[test]
    fn test_same_seed_same_plan() {
        let first = run(&[30, 40, 50, 60], &[10.0, 11.0, 12.0], 99);
        let second = run(&[30, 40, 50, 60], &[10.0, 11.0, 12.0], 99);
        assert_eq!(first.assignments, second.assignments);
    }

    #[test]
    fn test_no_assets_is_a_config_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = allocate_slots(&cuts(&[30]), &[], &AllocatorSettings::default(), &mut rng);
        assert!(matches!(result, Err(RenderError::Config(_))));
    }
}
