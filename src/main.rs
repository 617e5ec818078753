use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use scrollreel::{
    config::SequenceConfig,
    engine::{Engine, preload::FsFrameSource},
    player::Player,
    surface::HeadlessSurface,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const PLAY_USAGE: &str = "scrollreel play [config.json]";
const PROBE_USAGE: &str = "scrollreel probe [config.json]";

/// Log file used while the terminal is in the alternate screen.
const PLAY_LOG: &str = "scrollreel.log";

async fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("play") => {
            let config_path = args.next().map(PathBuf::from);
            init_logging(Some(Path::new(PLAY_LOG)))?;
            play(config_path.as_deref()).await
        }
        Some("probe") => {
            let config_path = args.next().map(PathBuf::from);
            init_logging(None)?;
            probe(config_path.as_deref()).await
        }
        _ => bail!(
            "scrollreel: scroll-scrubbed frame sequences\n\nUsage:\n  {PLAY_USAGE}\n  {PROBE_USAGE}"
        ),
    }
}

fn init_logging(file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SequenceConfig> {
    SequenceConfig::load_or_default(path).with_context(|| match path {
        Some(path) => format!("Failed to load {}", path.display()),
        None => "Invalid default config".to_string(),
    })
}

async fn play(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let mut player = Player::new(config);
    player.play().await
}

/// Preload headlessly, then sweep the track and print the frame mapping.
async fn probe(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let source = Arc::new(FsFrameSource::new(&config.asset_root));

    let mut surface = HeadlessSurface::new(1280.0, 720.0);
    let mut engine = Engine::new(&mut surface, config).context("Failed to attach engine")?;
    let report = engine.preload(source).await;

    println!(
        "frames: {} loaded, {} failed of {}",
        report.loaded, report.failed, report.total
    );
    println!(
        "track: {:.0}px at scale {}",
        engine.track_height(),
        engine.scale()
    );

    let max_scroll = engine.surface().max_scroll();
    for step in 0..=10 {
        let progress = step as f64 / 10.0;
        engine.surface_mut().scroll_y = max_scroll * progress;
        let outcome = engine.render_tick();
        println!(
            "scroll {:>6.0}px  progress {:.2}  frame {:?}  {:?}",
            max_scroll * progress,
            engine.compute_progress(),
            engine.drawn_index(),
            outcome,
        );
    }

    Ok(())
}
