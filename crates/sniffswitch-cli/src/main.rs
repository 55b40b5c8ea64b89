use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use sniffswitch_core::{
    FixedDelay, ObsController, Settings, ShutdownSignal, SnifferClient, Switcher,
    connect_with_retry,
};
use tracing::{error, info};

mod logging;

const CONFIG_FILE: &str = "config.ini";
const LOG_FILE: &str = "sniffswitch.log";

#[derive(Parser)]
#[command(name = "sniffswitch")]
#[command(version, about = "Drive OBS scenes and sources from RockSniffer game state")]
struct Args {
    /// Settings file, created with defaults when missing
    /// [default: config.ini next to the executable]
    #[arg(short, long, env = "SNIFFSWITCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log file [default: sniffswitch.log next to the settings file]
    #[arg(short, long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(default_config_path);
    let log_path = args
        .log_file
        .unwrap_or_else(|| sibling_path(&config_path, LOG_FILE));

    let _log_guard = logging::init(&log_path)?;
    info!("sniffswitch {} started", env!("CARGO_PKG_VERSION"));

    let (settings, _) = match Settings::load_or_create(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{}", e);
            return Err(e).with_context(|| format!("cannot start with {}", config_path.display()));
        }
    };
    info!("Loaded config from {}", config_path.display());
    for rule in &settings.behaviour.sources {
        info!("Source '{}' -> {}", rule.name, rule.state);
    }

    let shutdown = ShutdownSignal::new();
    let handler_signal = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        handler_signal.trigger();
    })?;

    let sniffer = SnifferClient::new(&settings.sniffer);
    info!("Polling RockSniffer at {}", sniffer.url());

    let Some(mut obs) = connect_with_retry(
        || ObsController::connect(&settings.controller),
        &FixedDelay::default(),
        &shutdown,
    ) else {
        info!("Shutdown complete");
        return Ok(());
    };

    let mut switcher = Switcher::new(settings);
    switcher.run(&sniffer, &mut obs, &shutdown);

    info!("Shutdown complete");
    Ok(())
}

/// `config.ini` beside the executable, or in the working directory if the
/// executable path is unknown.
fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .map(|exe| sibling_path(&exe, CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

fn sibling_path(path: &Path, file_name: &str) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(file_name),
        _ => PathBuf::from(file_name),
    }
}
