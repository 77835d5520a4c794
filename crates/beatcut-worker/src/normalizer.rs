//! Normalization of source assets into canonical form.
//!
//! Canonical assets share one geometry, frame rate and pixel format and
//! carry a keyframe on every frame, which is what makes the later
//! stream-copy trims frame exact. The encoder strategy is decided once per
//! job; hardware failures fall back to software per asset.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use beatcut_media::{EncoderStrategy, MediaBackend, MediaError, MediaResult, TranscodePlan};
use beatcut_models::encoding::NVENC_VIDEO_CODEC;
use beatcut_models::{Asset, TargetSpec};

use crate::catalog::SourceAsset;
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::logging::RenderLogger;
use crate::retry::{retry_async, RetryConfig};

/// Pick the encoder path for the whole job.
pub async fn resolve_strategy(backend: &dyn MediaBackend, prefer_hardware: bool) -> EncoderStrategy {
    if prefer_hardware && backend.supports_encoder(NVENC_VIDEO_CODEC).await {
        EncoderStrategy::Hardware
    } else {
        EncoderStrategy::Software
    }
}

/// One normalization unit: source in, canonical path out.
struct NormalizeTask<'a> {
    source: &'a SourceAsset,
    output: PathBuf,
}

/// Transcode with the job strategy, falling back to software when the
/// hardware encoder fails or cannot be planned for this source.
async fn transcode_one(
    backend: &dyn MediaBackend,
    task: &NormalizeTask<'_>,
    strategy: EncoderStrategy,
    target: &TargetSpec,
    retry: &RetryConfig,
    logger: &RenderLogger,
) -> MediaResult<Asset> {
    let input = task.source.path.as_path();
    let output = task.output.as_path();

    let hardware = match strategy {
        EncoderStrategy::Hardware if task.source.info.has_dimensions() => {
            TranscodePlan::hardware(&task.source.info, target)
        }
        EncoderStrategy::Hardware => {
            logger.warning(
                "normalize",
                &format!(
                    "{} reports no frame size, using the software encoder",
                    input.display()
                ),
            );
            None
        }
        EncoderStrategy::Software => None,
    };

    let mut done = false;
    if let Some(plan) = hardware {
        match run_plan(backend, input, output, &plan, retry).await {
            Ok(()) => done = true,
            Err(e) if e.is_tool_missing() => return Err(e),
            Err(e) => logger.warning(
                "normalize",
                &format!(
                    "Hardware encode failed for {}, retrying in software: {}",
                    input.display(),
                    e
                ),
            ),
        }
    }

    if !done {
        let plan = TranscodePlan::software(&task.source.info, target);
        run_plan(backend, input, output, &plan, retry).await?;
    }

    let info = retry_async(retry, MediaError::is_transient, || backend.probe(output)).await?;
    if !(info.duration.is_finite() && info.duration > 0.0) {
        return Err(MediaError::invalid_video(format!(
            "Canonical asset {} has no duration",
            output.display()
        )));
    }

    Ok(Asset::new(output, info.duration, info.width, info.height))
}

async fn run_plan(
    backend: &dyn MediaBackend,
    input: &Path,
    output: &Path,
    plan: &TranscodePlan,
    retry: &RetryConfig,
) -> MediaResult<()> {
    retry_async(retry, MediaError::is_transient, || {
        backend.transcode(input, output, plan)
    })
    .await
}

/// Normalize every source into `canonical_path(i)`, at most
/// `config.max_ffmpeg_processes` at a time.
///
/// Results keep source order, so the returned index is the asset id.
pub async fn normalize_assets(
    backend: &dyn MediaBackend,
    sources: &[SourceAsset],
    canonical_path: impl Fn(usize) -> PathBuf,
    config: &RenderConfig,
    logger: &RenderLogger,
) -> RenderResult<Vec<Asset>> {
    let strategy = resolve_strategy(backend, config.prefer_hardware).await;
    logger.stage(
        "normalize",
        &format!("Normalizing {} assets ({} encoder)", sources.len(), strategy),
    );

    let retry = RetryConfig::new("transcode")
        .with_max_retries(config.tool_retries)
        .with_base_delay(config.retry_base_delay);

    let tasks: Vec<NormalizeTask<'_>> = sources
        .iter()
        .enumerate()
        .map(|(i, source)| NormalizeTask {
            source,
            output: canonical_path(i),
        })
        .collect();

    let sem = Arc::new(Semaphore::new(config.max_ffmpeg_processes.max(1)));
    let futures = tasks.iter().map(|task| {
        let sem = sem.clone();
        let retry = &retry;
        async move {
            let _permit = sem
                .acquire()
                .await
                .map_err(|_| MediaError::internal("normalize semaphore closed"))?;
            transcode_one(backend, task, strategy, &config.target, retry, logger).await
        }
    });

    let mut assets = Vec::with_capacity(tasks.len());
    for (task, result) in tasks.iter().zip(join_all(futures).await) {
        match result {
            Ok(asset) => assets.push(asset),
            Err(e) => {
                logger.failure(
                    "normalize",
                    &format!("Failed to normalize {}: {}", task.source.path.display(), e),
                );
                return Err(RenderError::tool("normalize", e));
            }
        }
    }

    Ok(assets)
}
