//! Beat-synced render CLI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use beatcut_media::FfmpegBackend;
use beatcut_worker::{BeatSyncRenderer, RenderConfig};

/// Cut a folder of clips to a beat timeline and lay a track under it.
#[derive(Debug, Parser)]
#[command(name = "beatcut", version, about)]
struct Cli {
    /// Beat timeline XML
    #[arg(long)]
    beats: PathBuf,

    /// Backing audio track
    #[arg(long)]
    audio: PathBuf,

    /// Directory of source clips (.mp4, .mov, .avi, .mkv)
    #[arg(long)]
    assets: PathBuf,

    /// Output video path
    #[arg(long, short)]
    output: PathBuf,

    /// Clip appended after the beat-synced part
    #[arg(long)]
    outro: Option<PathBuf>,

    /// Seed for slot allocation (overrides BEATCUT_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Parent directory for scratch files (overrides BEATCUT_WORK_DIR)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Never use the hardware encoder
    #[arg(long)]
    no_hw: bool,

    /// Where to write the command transcript
    #[arg(long)]
    command_log: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> RenderConfig {
        let mut config = RenderConfig::from_env();
        if let Some(seed) = self.seed {
            config.rng_seed = Some(seed);
        }
        if let Some(dir) = &self.work_dir {
            config.work_dir = dir.clone();
        }
        if self.no_hw {
            config.prefer_hardware = false;
        }
        if let Some(path) = &self.command_log {
            config.command_log_path = Some(path.clone());
        }
        config
    }
}

fn init_tracing() -> anyhow::Result<()> {
    // Colored output for terminals, JSON for log shippers
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("beatcut=info".parse()?)
        .add_directive("beatcut_worker=info".parse()?)
        .add_directive("beatcut_media=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();
    info!("Render config: {:?}", config);

    let backend = Arc::new(FfmpegBackend::new().with_timeout(config.tool_timeout.as_secs()));
    let mut renderer = BeatSyncRenderer::from_beats_file(&cli.beats, &cli.audio, backend, config)
        .with_context(|| format!("loading beat timeline {}", cli.beats.display()))?;
    info!(
        "Loaded {} beat marks over {:.2}s",
        renderer.timeline().marks().len(),
        renderer.timeline().total_duration()
    );
    if let Some(outro) = &cli.outro {
        renderer = renderer.with_outro(outro);
    }

    let outcome = renderer
        .render(&cli.assets, &cli.output)
        .await
        .context("render failed")?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
