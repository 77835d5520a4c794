//! Final assembly: join clips, lay the track under them, append the outro.

use std::path::{Path, PathBuf};

use beatcut_media::{replace_atomically, MediaBackend, MediaError};
use beatcut_models::{EncoderConfig, TargetSpec};

use crate::error::{RenderError, RenderResult};
use crate::logging::RenderLogger;
use crate::scratch::ScratchDir;

/// Inputs for one assembly run.
#[derive(Debug)]
pub struct AssemblyRequest<'a> {
    /// Clips in playback order
    pub clips: &'a [PathBuf],
    pub audio: &'a Path,
    pub outro: Option<&'a Path>,
    pub output: &'a Path,
    /// Holds every intermediate file
    pub scratch: &'a ScratchDir,
    pub target: &'a TargetSpec,
}

/// Produce the finished video at `request.output`.
///
/// Intermediates stay in scratch; the output path is only replaced once
/// the last step has succeeded, so a failed run leaves it untouched.
pub async fn assemble(
    backend: &dyn MediaBackend,
    request: &AssemblyRequest<'_>,
    logger: &RenderLogger,
) -> RenderResult<()> {
    if request.clips.is_empty() {
        return Err(RenderError::config("Nothing to assemble"));
    }

    let joined = request.scratch.intermediate("joined.mp4");
    logger.stage(
        "assemble",
        &format!("Joining {} clips", request.clips.len()),
    );
    backend
        .concat(request.clips, &joined)
        .await
        .map_err(|e| RenderError::tool("concat", e))?;

    let muxed = request.scratch.intermediate("muxed.mp4");
    backend
        .mux_audio(&joined, request.audio, &muxed)
        .await
        .map_err(|e| RenderError::tool("mux", e))?;

    let finished = match request.outro {
        Some(outro) if outro.exists() => {
            logger.stage("assemble", &format!("Appending outro {}", outro.display()));
            let with_outro = request.scratch.intermediate("with_outro.mp4");
            backend
                .append_outro(
                    &muxed,
                    outro,
                    &with_outro,
                    request.target,
                    &EncoderConfig::default(),
                )
                .await
                .map_err(|e| RenderError::tool("outro", e))?;
            with_outro
        }
        Some(outro) => {
            logger.warning(
                "assemble",
                &format!("Outro {} not found, skipping", outro.display()),
            );
            muxed
        }
        None => muxed,
    };

    replace_atomically(&finished, request.output)
        .await
        .map_err(|e| match e {
            MediaError::Io(io) => RenderError::Io(io),
            other => RenderError::tool("publish", other),
        })?;
    logger.stage(
        "assemble",
        &format!("Wrote {}", request.output.display()),
    );
    Ok(())
}
