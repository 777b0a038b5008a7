//! stemflow command-line front end.
//!
//! Plays the presentation-layer role: builds a `JobConfig` from the
//! command line and settings, submits it to the job worker and renders
//! the event stream until the terminal event arrives.

mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use tracing::warn;

use stemflow_core::config::ConfigManager;
use stemflow_core::logging::{init_tracing_with_file, LogLevel};
use stemflow_core::models::{
    channel_observer, is_supported_audio_file, Bitrate, JobConfig, SeparationModel, MODEL_CATALOG,
};
use stemflow_core::orchestrator::{JobWorker, PipelineJob};

use render::{EventRenderer, RenderMode};

#[derive(Parser)]
#[command(name = "stemflow")]
#[command(about = "Fetch or open audio, log its tempo and key, transcode to MP3 and split into stems")]
#[command(version)]
struct Cli {
    /// URL or local audio file
    #[arg(required_unless_present = "list_models")]
    source: Option<String>,

    /// MP3 bitrate in kbps (96, 128, 192, 320)
    #[arg(short, long)]
    bitrate: Option<Bitrate>,

    /// Separation model id (see --list-models)
    #[arg(short, long)]
    model: Option<SeparationModel>,

    /// Only split vocals from everything else
    #[arg(long)]
    two_stems: bool,

    /// Output directory (created if missing)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print events as JSON lines on stdout
    #[arg(long)]
    json_events: bool,

    /// Only print the final result
    #[arg(short, long)]
    quiet: bool,

    /// Debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,

    /// List separation models and exit
    #[arg(long)]
    list_models: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.list_models {
        for info in MODEL_CATALOG.iter() {
            println!("{:<12} {}", info.id, info.description);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut manager = ConfigManager::new(&config_path);
    manager
        .load_or_create()
        .with_context(|| format!("loading settings from {}", config_path.display()))?;
    manager
        .ensure_dirs_exist()
        .context("creating configured folders")?;

    // Job log lines are rendered below; tracing only adds diagnostics.
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let _tracing_guard = init_tracing_with_file(level, &manager.logs_folder());

    let settings = manager.settings().clone();
    let output_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.paths.output_folder));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let source = cli.source.as_deref().unwrap_or_default();
    let config = JobConfig::from_source(source, output_dir)
        .with_bitrate(cli.bitrate.unwrap_or(settings.defaults.bitrate))
        .with_model(cli.model.unwrap_or(settings.defaults.model))
        .with_two_stems(cli.two_stems || settings.defaults.two_stems);

    if config.is_local_file && !is_supported_audio_file(Path::new(&config.source)) {
        warn!("{} does not look like a supported audio file", config.source);
    }

    let (tx, rx) = mpsc::channel();
    let worker = JobWorker::new();
    let handle = worker
        .submit(
            PipelineJob::with_settings(config, settings),
            Box::new(channel_observer(tx)),
        )
        .context("starting job")?;

    let mode = if cli.json_events {
        RenderMode::Json
    } else if cli.quiet {
        RenderMode::Quiet
    } else {
        RenderMode::Text
    };
    let mut renderer = EventRenderer::new(mode);
    for event in rx {
        let terminal = event.is_terminal();
        renderer.render(&event)?;
        if terminal {
            break;
        }
    }

    let outcome = handle.join().context("waiting for job")?;
    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// `<config dir>/settings.toml`, or `.config/stemflow.toml` when the
/// platform has no config directory.
fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "stemflow")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from(".config/stemflow.toml"))
}
