//! Render job: beat timeline + asset folder + track in, finished video out.
//!
//! Stages run strictly in order: plan cuts, discover and probe sources,
//! normalize, allocate slots, extract clips, assemble. All intermediate
//! files live in a scratch directory scoped to the job, and the command
//! transcript is written whether the job succeeds or not.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use beatcut_media::MediaBackend;
use beatcut_models::{AllocationWarning, Assignment, BeatTimeline};

use crate::assembler::{assemble, AssemblyRequest};
use crate::catalog::{catalog_sources, discover_assets};
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::extractor::extract_clips;
use crate::logging::RenderLogger;
use crate::normalizer::normalize_assets;
use crate::retry::RetryConfig;
use crate::schedule::beat_plan::total_frames;
use crate::schedule::{allocate_slots, plan_cuts, AllocatorSettings};
use crate::scratch::ScratchDir;

/// Summary of a successful render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub job_id: String,
    pub output_path: PathBuf,
    pub cut_count: usize,
    pub total_frames: u64,
    pub assignments: Vec<Assignment>,
    /// Cuts that had to accept a degraded slot
    pub warnings: Vec<AllocationWarning>,
    /// Set when the command transcript was written
    pub command_log_path: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// What the pipeline hands back before the transcript is written.
struct PipelineResult {
    cut_count: usize,
    total_frames: u64,
    assignments: Vec<Assignment>,
    warnings: Vec<AllocationWarning>,
}

/// Beat-synced renderer for one timeline and backing track.
pub struct BeatSyncRenderer {
    timeline: BeatTimeline,
    audio_path: PathBuf,
    outro_path: Option<PathBuf>,
    config: RenderConfig,
    backend: Arc<dyn MediaBackend>,
}

impl BeatSyncRenderer {
    pub fn new(
        timeline: BeatTimeline,
        audio_path: impl Into<PathBuf>,
        backend: Arc<dyn MediaBackend>,
        config: RenderConfig,
    ) -> Self {
        Self {
            timeline,
            audio_path: audio_path.into(),
            outro_path: None,
            config,
            backend,
        }
    }

    /// Load the beat timeline from an XML file.
    pub fn from_beats_file(
        beats_path: impl AsRef<Path>,
        audio_path: impl Into<PathBuf>,
        backend: Arc<dyn MediaBackend>,
        config: RenderConfig,
    ) -> RenderResult<Self> {
        let timeline = BeatTimeline::from_file(beats_path)?;
        Ok(Self::new(timeline, audio_path, backend, config))
    }

    /// Append this clip after the beat-synced part, when it exists.
    pub fn with_outro(mut self, outro: impl Into<PathBuf>) -> Self {
        self.outro_path = Some(outro.into());
        self
    }

    pub fn timeline(&self) -> &BeatTimeline {
        &self.timeline
    }

    /// Render the clips found in `assets_dir` into `output_path`.
    ///
    /// On failure nothing is left in the work directory and any file
    /// already at `output_path` is untouched.
    pub async fn render(&self, assets_dir: &Path, output_path: &Path) -> RenderResult<RenderOutcome> {
        let job_id = Uuid::new_v4();
        let logger = RenderLogger::new(&job_id);
        let span = logger.span();

        async {
            let started_at = Utc::now();
            let result = self.run(&job_id, assets_dir, output_path, &logger).await;

            let log_path = self.config.command_log_for(output_path);
            let command_log_path = self.write_transcript(&log_path, &logger).await;

            match result {
                Ok(done) => {
                    let finished_at = Utc::now();
                    logger.stage(
                        "done",
                        &format!(
                            "Rendered {} cuts ({} frames) in {}ms, {} degraded",
                            done.cut_count,
                            done.total_frames,
                            (finished_at - started_at).num_milliseconds(),
                            done.warnings.len()
                        ),
                    );
                    Ok(RenderOutcome {
                        job_id: logger.job_id().to_string(),
                        output_path: output_path.to_path_buf(),
                        cut_count: done.cut_count,
                        total_frames: done.total_frames,
                        assignments: done.assignments,
                        warnings: done.warnings,
                        command_log_path,
                        started_at,
                        finished_at,
                    })
                }
                Err(e) => {
                    logger.failure("done", &format!("Render failed ({:?}): {}", e.kind(), e));
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        job_id: &Uuid,
        assets_dir: &Path,
        output_path: &Path,
        logger: &RenderLogger,
    ) -> RenderResult<PipelineResult> {
        let config = &self.config;
        let fps = config.target.fps;

        let cuts = plan_cuts(&self.timeline, fps);
        if cuts.is_empty() {
            return Err(RenderError::config("Beat timeline yields no cuts"));
        }
        let frames = total_frames(&cuts);
        logger.stage(
            "plan",
            &format!("{} cuts, {} frames at {} fps", cuts.len(), frames, fps),
        );

        if !self.audio_path.is_file() {
            return Err(RenderError::config(format!(
                "Audio track not found: {}",
                self.audio_path.display()
            )));
        }

        let source_paths = discover_assets(assets_dir).await?;

        self.backend
            .check_available()
            .await
            .map_err(|e| RenderError::ToolUnavailable(e.to_string()))?;

        let scratch = ScratchDir::create(&config.work_dir, &job_id.to_string())?;

        let probe_retry = RetryConfig::new("probe")
            .with_max_retries(config.tool_retries)
            .with_base_delay(config.retry_base_delay);
        let sources =
            catalog_sources(self.backend.as_ref(), &source_paths, &probe_retry, logger).await?;

        let assets = normalize_assets(
            self.backend.as_ref(),
            &sources,
            |i| scratch.canonical_path(i),
            config,
            logger,
        )
        .await?;

        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let plan = allocate_slots(
            &cuts,
            &assets,
            &AllocatorSettings::from_config(config),
            &mut rng,
        )?;
        for warning in &plan.warnings {
            logger.warning(
                "allocate",
                &format!(
                    "Cut {} uses a degraded slot on {} ({:?})",
                    warning.cut_index, assets[warning.asset.0].display_name(), warning.reason
                ),
            );
        }

        let clips = extract_clips(
            self.backend.as_ref(),
            &plan.assignments,
            &assets,
            |i| scratch.clip_path(i),
            fps,
            config.max_ffmpeg_processes,
            logger,
        )
        .await?;

        assemble(
            self.backend.as_ref(),
            &AssemblyRequest {
                clips: &clips,
                audio: &self.audio_path,
                outro: self.outro_path.as_deref(),
                output: output_path,
                scratch: &scratch,
                target: &config.target,
            },
            logger,
        )
        .await?;

        scratch.close();

        Ok(PipelineResult {
            cut_count: cuts.len(),
            total_frames: frames,
            assignments: plan.assignments,
            warnings: plan.warnings,
        })
    }

    /// Write the backend's command transcript; a failure here only warns.
    async fn write_transcript(&self, path: &Path, logger: &RenderLogger) -> Option<PathBuf> {
        let lines = self.backend.command_transcript();
        let mut body = lines.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                logger.warning("transcript", &format!("Cannot create {}: {}", parent.display(), e));
                return None;
            }
        }

        match tokio::fs::write(path, body).await {
            Ok(()) => Some(path.to_path_buf()),
            Err(e) => {
                logger.warning(
                    "transcript",
                    &format!("Failed to write command log {}: {}", path.display(), e),
                );
                None
            }
        }
    }
}
