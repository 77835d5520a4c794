//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use beatcut_models::TargetSpec;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Parent directory for per-job scratch directories
    pub work_dir: PathBuf,
    /// Maximum concurrent FFmpeg processes per job
    pub max_ffmpeg_processes: usize,
    /// Per-invocation timeout for external tools
    pub tool_timeout: Duration,
    /// Try NVENC before the software encoder when available
    pub prefer_hardware: bool,
    /// Extra attempts for probe/transcode after a transient failure
    pub tool_retries: u32,
    /// Base delay for retry backoff
    pub retry_base_delay: Duration,
    /// Fixed seed for the slot allocator (random when unset)
    pub rng_seed: Option<u64>,
    /// Tail of each asset kept out of reach of trims
    pub guard_margin_secs: f64,
    /// Random draws per candidate asset before moving on
    pub attempts_per_asset: u32,
    /// Canonical output format
    pub target: TargetSpec,
    /// Where to write the command transcript (defaults next to the output)
    pub command_log_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            max_ffmpeg_processes: 4,
            tool_timeout: Duration::from_secs(600),
            prefer_hardware: true,
            tool_retries: 2,
            retry_base_delay: Duration::from_millis(500),
            rng_seed: None,
            guard_margin_secs: 0.1,
            attempts_per_asset: 10,
            target: TargetSpec::default(),
            command_log_path: None,
        }
    }
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("BEATCUT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            max_ffmpeg_processes: env_parse("BEATCUT_MAX_FFMPEG")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_ffmpeg_processes),
            tool_timeout: env_parse("BEATCUT_TOOL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.tool_timeout),
            prefer_hardware: env_parse("BEATCUT_PREFER_HW").unwrap_or(defaults.prefer_hardware),
            tool_retries: env_parse("BEATCUT_TOOL_RETRIES").unwrap_or(defaults.tool_retries),
            retry_base_delay: env_parse("BEATCUT_RETRY_BASE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            rng_seed: env_parse("BEATCUT_SEED"),
            guard_margin_secs: defaults.guard_margin_secs,
            attempts_per_asset: env_parse("BEATCUT_ATTEMPTS_PER_ASSET")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.attempts_per_asset),
            target: defaults.target,
            command_log_path: None,
        }
    }

    /// Transcript path for a render written to `output`.
    pub fn command_log_for(&self, output: &std::path::Path) -> PathBuf {
        self.command_log_path.clone().unwrap_or_else(|| {
            let name = output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "render".to_string());
            output.with_file_name(format!("{}.commands.txt", name))
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
