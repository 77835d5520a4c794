//! Frame-exact clip extraction from canonical assets.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use beatcut_media::{ClipWindow, MediaBackend, MediaError};
use beatcut_models::{Asset, Assignment};

use crate::error::{RenderError, RenderResult};
use crate::logging::RenderLogger;

/// Trim every assignment out of its canonical asset.
///
/// Runs up to `max_concurrency` extractions at once. The returned paths
/// follow assignment order regardless of completion order, and the first
/// failure (in that order) fails the whole batch.
pub async fn extract_clips(
    backend: &dyn MediaBackend,
    assignments: &[Assignment],
    assets: &[Asset],
    clip_path: impl Fn(usize) -> PathBuf,
    fps: u32,
    max_concurrency: usize,
    logger: &RenderLogger,
) -> RenderResult<Vec<PathBuf>> {
    logger.stage(
        "extract",
        &format!("Extracting {} clips", assignments.len()),
    );

    let outputs: Vec<PathBuf> = (0..assignments.len()).map(&clip_path).collect();
    let sem = Arc::new(Semaphore::new(max_concurrency.max(1)));

    let futures = assignments.iter().zip(&outputs).map(|(assignment, output)| {
        let sem = sem.clone();
        async move {
            let asset = assets.get(assignment.asset.0).ok_or_else(|| {
                MediaError::internal(format!("Unknown asset {}", assignment.asset))
            })?;
            let window = ClipWindow {
                start: assignment.start_time,
                frames: assignment.duration_frames,
                fps,
            };
            let _permit = sem
                .acquire()
                .await
                .map_err(|_| MediaError::internal("extract semaphore closed"))?;
            backend.extract(&asset.path, output, &window).await
        }
    });

    let results = join_all(futures).await;
    for (assignment, result) in assignments.iter().zip(results) {
        if let Err(e) = result {
            logger.failure(
                "extract",
                &format!("Clip for cut {} failed: {}", assignment.cut_index, e),
            );
            return Err(RenderError::tool("extract", e));
        }
    }

    Ok(outputs)
}
