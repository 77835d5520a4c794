//! Filter graphs and list files used when assembling the final render.

use std::path::Path;

use beatcut_models::TargetSpec;

/// Audio format both sides of the outro join are brought to.
const JOIN_AUDIO_FORMAT: &str = "aresample=48000,aformat=sample_fmts=fltp:channel_layouts=stereo";

/// Body of a concat-demuxer list file, one `file '...'` line per clip.
pub fn concat_list(clips: &[impl AsRef<Path>]) -> String {
    clips
        .iter()
        .map(|clip| {
            let path = clip.as_ref().to_string_lossy();
            format!("file '{}'\n", path.replace('\'', r"'\''"))
        })
        .collect()
}

/// Filter graph joining the muxed render (input 0) with an outro (input 1).
///
/// When the outro has no audio, input 2 must be a silent `anullsrc` source
/// trimmed to the outro's length.
#[derive(Debug, Clone, PartialEq)]
pub struct OutroGraph {
    pub filter_complex: String,
    pub video_label: String,
    pub audio_label: String,
}

/// Build the outro join graph.
pub fn build_outro_graph(target: &TargetSpec, outro_has_audio: bool) -> OutroGraph {
    let outro_audio_input = if outro_has_audio { "1:a" } else { "2:a" };
    let chains = [
        format!(
            "[0:v]fps={fps},format={pix},setsar=1[v0]",
            fps = target.fps,
            pix = target.pix_fmt
        ),
        format!(
            "[1:v]fps={fps},scale={w}:{h}:force_original_aspect_ratio=increase:force_divisible_by=2,\
             crop={w}:{h},format={pix},setsar=1[v1]",
            fps = target.fps,
            w = target.width,
            h = target.height,
            pix = target.pix_fmt
        ),
        format!("[0:a]{}[a0]", JOIN_AUDIO_FORMAT),
        format!("[{}]{}[a1]", outro_audio_input, JOIN_AUDIO_FORMAT),
        "[v0][a0][v1][a1]concat=n=2:v=1:a=1[vout][aout]".to_string(),
    ];

    OutroGraph {
        filter_complex: chains.join(";"),
        video_label: "[vout]".to_string(),
        audio_label: "[aout]".to_string(),
    }
}

/// `anullsrc` graph used as the outro's audio when it has none.
pub fn silent_audio_source() -> String {
    "anullsrc=r=48000:cl=stereo".to_string()
}
