//! Vantage - desktop viewer for remote scene models
//!
//! Fetches a model description over HTTP, shows it with installation
//! status labels and lets the user orbit, pan and zoom around it.

mod app;
mod hierarchy;
mod input;
mod object_json;
mod surface;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use vantage_scene::{config, Viewport};

#[derive(Parser, Debug)]
#[command(name = "vantage")]
#[command(about = "Viewer for remote scene models with installation-progress labels")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "vantage.toml")]
    config: PathBuf,

    /// Model URL, overrides the configuration file
    #[arg(short, long)]
    url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Write the default configuration to the config path and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Vantage v{}", env!("CARGO_PKG_VERSION"));

    if args.write_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;
    if let Some(url) = args.url {
        config.model.url = url;
    }

    info!(
        url = %config.model.url,
        timeout_secs = config.model.timeout_secs,
        "Configuration loaded"
    );

    // Fetch and deserialize run here; bevy keeps the main thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("vantage-io")
        .build()
        .context("Failed to start async runtime")?;

    let host = app::ViewerHost::new(&config, Viewport::new(args.width, args.height), runtime)?;
    app::run(config, host, args.width, args.height)
}
