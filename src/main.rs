//! Binary entrypoint for panorama capture.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use panorama_capture::cache::complete_sets;
use panorama_capture::config::Configuration;
use panorama_capture::controller::PanoramaController;
use panorama_capture::events::StageOutcome;
use panorama_capture::host::{CpuTextures, ReplayRenderer};
use panorama_capture::layout::STAGE_COUNT;
use panorama_capture::selector::Background;
use panorama_capture::tasks::writer::{self, WriteQueue};

#[derive(Debug, Parser)]
#[command(name = "panorama", version, about = "Capture and pick cube-map panoramas")]
struct Cli {
    /// Path to YAML config file; built-in defaults when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List complete panorama sets under the save root
    List,
    /// Pick a menu background the way the host does when the menu opens
    Select,
    /// Run a capture session, replaying one image file per stage as the framebuffer
    Capture {
        #[arg(value_name = "FRAME", num_args = STAGE_COUNT, required = true)]
        frames: Vec<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("panorama_capture={level}").parse()?)
        .add_directive(format!("panorama={level}").parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Configuration> {
    let cfg = match path {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Configuration::default(),
    };
    cfg.validated().context("validating configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let cfg = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::List => list(&cfg),
        Command::Select => select(&cfg),
        Command::Capture { frames } => capture(&cfg, frames).await,
    }
}

fn list(cfg: &Configuration) -> Result<()> {
    let root = &cfg.panorama_save_path;
    std::fs::create_dir_all(root)
        .with_context(|| format!("creating save root {}", root.display()))?;
    let sets = complete_sets(root)?;
    info!(count = sets.len(), root = %root.display(), "scanned panorama sets");
    for set in sets {
        println!("{}", set.display());
    }
    Ok(())
}

fn select(cfg: &Configuration) -> Result<()> {
    let (queue, _requests) = WriteQueue::channel();
    let controller = PanoramaController::new(cfg, queue, CpuTextures);
    match controller.on_menu_opened(None) {
        Background::Builtin(id) => println!("builtin {id}"),
        Background::Custom(set) => println!("custom {}", set.dir().display()),
    }
    Ok(())
}

async fn capture(cfg: &Configuration, frames: Vec<PathBuf>) -> Result<()> {
    let (queue, requests) = WriteQueue::channel();
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<StageOutcome>();
    let cancel = CancellationToken::new();
    let mut writer = tokio::spawn(writer::run(
        cfg.panorama_save_path.clone(),
        requests,
        Some(outcome_tx),
        cancel.clone(),
        cfg.writer_max_concurrent_writes,
    ));

    let mut controller = PanoramaController::new(cfg, queue, CpuTextures);
    let mut renderer = ReplayRenderer::new(frames);
    controller.on_capture_key_pressed(&mut renderer);
    while controller.capture().is_capturing() {
        controller.on_render_frame(&mut renderer);
    }
    // Dropping the controller closes the write queue so the writer can finish.
    drop(controller);

    match tokio::time::timeout(cfg.writer_drain_timeout, &mut writer).await {
        Ok(joined) => joined.context("writer task panicked")??,
        Err(_) => {
            warn!(timeout = ?cfg.writer_drain_timeout, "writes still pending; giving up");
            cancel.cancel();
            writer.abort();
            anyhow::bail!(
                "stage writes did not finish within {:?}",
                cfg.writer_drain_timeout
            );
        }
    }

    let mut failed = 0;
    while let Some(outcome) = outcome_rx.recv().await {
        match outcome {
            StageOutcome::Written { path, .. } => println!("{}", path.display()),
            StageOutcome::Failed { stage, reason, .. } => {
                failed += 1;
                eprintln!("stage {stage} failed: {reason}");
            }
        }
    }
    anyhow::ensure!(failed == 0, "{failed} of {STAGE_COUNT} stages failed");
    Ok(())
}
