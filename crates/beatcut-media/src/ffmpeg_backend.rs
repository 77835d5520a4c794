//! `MediaBackend` backed by the ffmpeg/ffprobe command-line tools.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use beatcut_models::{EncoderConfig, TargetSpec};

use crate::backend::{ClipWindow, MediaBackend};
use crate::command::{check_ffmpeg, check_ffprobe, CommandLog, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{build_outro_graph, concat_list, silent_audio_source};
use crate::plan::TranscodePlan;
use crate::probe::{probe_video, VideoInfo};

/// Audio settings for the final mux.
const MUX_AUDIO_CODEC: &str = beatcut_models::encoding::DEFAULT_AUDIO_CODEC;
const MUX_AUDIO_BITRATE: &str = beatcut_models::encoding::DEFAULT_AUDIO_BITRATE;

/// FFmpeg CLI implementation of [`MediaBackend`].
///
/// Owns the command transcript of one render job.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    runner: FfmpegRunner,
    log: Arc<CommandLog>,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegBackend {
    pub fn new() -> Self {
        let log = Arc::new(CommandLog::new());
        Self {
            runner: FfmpegRunner::new().with_command_log(log.clone()),
            log,
        }
    }

    /// Kill any tool invocation running longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    fn require_input(path: &Path) -> MediaResult<()> {
        if path.exists() {
            Ok(())
        } else {
            Err(MediaError::FileNotFound(path.to_path_buf()))
        }
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn check_available(&self) -> MediaResult<()> {
        check_ffmpeg()?;
        check_ffprobe()?;
        Ok(())
    }

    async fn supports_encoder(&self, encoder: &str) -> bool {
        if check_ffmpeg().is_err() {
            return false;
        }
        let args = vec!["-hide_banner".to_string(), "-encoders".to_string()];
        match self.runner.capture("ffmpeg", &args).await {
            Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
                .lines()
                .any(|line| line.split_whitespace().nth(1) == Some(encoder)),
            Ok(_) => false,
            Err(e) => {
                debug!("Encoder listing failed: {}", e);
                false
            }
        }
    }

    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        probe_video(&self.runner, path).await
    }

    async fn transcode(&self, input: &Path, output: &Path, plan: &TranscodePlan) -> MediaResult<()> {
        Self::require_input(input)?;
        info!(
            strategy = %plan.strategy,
            "Normalizing {} -> {}",
            input.display(),
            output.display()
        );
        self.runner.run(&plan.to_command(input, output)).await
    }

    async fn extract(&self, input: &Path, output: &Path, window: &ClipWindow) -> MediaResult<()> {
        Self::require_input(input)?;
        // Canonical assets are all-intra, so an input seek plus stream copy
        // lands exactly on the requested frame.
        let cmd = FfmpegCommand::new(input, output)
            .seek(window.start)
            .frame_count(window.frames)
            .codec_copy()
            .no_audio()
            .output_args(["-avoid_negative_ts", "make_zero"]);
        self.runner.run(&cmd).await
    }

    async fn concat(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()> {
        if clips.is_empty() {
            return Err(MediaError::internal("Nothing to concatenate"));
        }
        let list_path = output.with_extension("concat.txt");
        tokio::fs::write(&list_path, concat_list(clips)).await?;

        let cmd = FfmpegCommand::new(&list_path, output)
            .input_args(["-f", "concat", "-safe", "0"])
            .codec_copy()
            .output_args(["-movflags", "+faststart"]);
        let result = self.runner.run(&cmd).await;

        let _ = tokio::fs::remove_file(&list_path).await;
        result
    }

    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
        Self::require_input(video)?;
        Self::require_input(audio)?;
        let cmd = FfmpegCommand::new(video, output)
            .add_input(audio)
            .map("0:v:0")
            .map("1:a:0")
            .output_args(["-c:v", "copy", "-c:a", MUX_AUDIO_CODEC, "-b:a", MUX_AUDIO_BITRATE])
            .output_arg("-shortest")
            .output_args(["-movflags", "+faststart"]);
        self.runner.run(&cmd).await
    }

    async fn append_outro(
        &self,
        main: &Path,
        outro: &Path,
        output: &Path,
        target: &TargetSpec,
        encoder: &EncoderConfig,
    ) -> MediaResult<()> {
        Self::require_input(main)?;
        let outro_info = self.probe(outro).await?;
        let graph = build_outro_graph(target, outro_info.has_audio);

        let mut cmd = FfmpegCommand::new(main, output).add_input(outro);
        if !outro_info.has_audio {
            cmd = cmd
                .add_lavfi_input(silent_audio_source())
                .input_args(["-t".to_string(), format!("{:.3}", outro_info.duration)]);
        }

        let cmd = cmd
            .filter_complex(graph.filter_complex)
            .map(graph.video_label)
            .map(graph.audio_label)
            .output_args(encoder.to_ffmpeg_args())
            .output_args(["-pix_fmt".to_string(), target.pix_fmt.clone()])
            .output_args(["-c:a", MUX_AUDIO_CODEC, "-b:a", MUX_AUDIO_BITRATE])
            .output_args(["-movflags", "+faststart"]);
        self.runner.run(&cmd).await
    }

    fn command_transcript(&self) -> Vec<String> {
        self.log.lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_starts_empty() {
        let backend = FfmpegBackend::new().with_timeout(30);
        assert!(backend.command_transcript().is_empty());
    }

    #[tokio::test]
    async fn test_missing_inputs_fail_before_spawning() {
        let backend = FfmpegBackend::new();
        let window = ClipWindow {
            start: 0.0,
            frames: 30,
            fps: 30,
        };
        let result = backend
            .extract(Path::new("/nonexistent/canonical.mp4"), Path::new("/tmp/clip.mp4"), &window)
            .await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
        assert!(backend.command_transcript().is_empty());
    }

    #[test]
    fn test_empty_concat_is_rejected() {
        let backend = FfmpegBackend::new();
        let result = tokio_test::block_on(backend.concat(&[], Path::new("/tmp/joined.mp4")));
        assert!(matches!(result, Err(MediaError::Internal(_))));
    }
}
