#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use trailsense_core::capture;
use trailsense_core::config::load_from_path;
use trailsense_core::sink::EventSink;
use trailsense_core::trail::{TrailStore, TrailUpdater};

#[derive(Parser, Debug)]
#[command(author, version, about = "Passive network trail-matching sensor")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", default_value = "trailsense.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            init_tracing("info");
            error!(%err, "failed to load configuration");
            std::process::exit(1);
        }
    };
    init_tracing(&cfg.logging.level);

    if let Err(reason) = validate_interface(&cfg.monitor_interface) {
        error!(reason, "unsupported interface for this platform");
        std::process::exit(1);
    }

    if !check_privileges() {
        error!("insufficient privileges to open a live capture; re-run with elevated permissions");
        std::process::exit(1);
    }

    let sink = Arc::new(EventSink::new(cfg.log_dir.clone()));
    if let Err(err) = sink.create_log_directory() {
        error!(%err, dir = %cfg.log_dir.display(), "failed to create log directory");
        std::process::exit(1);
    }

    let store = Arc::new(TrailStore::new());
    let updater = TrailUpdater::new(
        cfg.server_update.clone(),
        cfg.trail_cache_path.clone(),
        Duration::from_secs(cfg.update_period_secs),
    );
    let updater_store = Arc::clone(&store);
    tokio::spawn(updater.run(updater_store));

    let (cap, link_type) = match capture::open(
        &cfg.monitor_interface,
        cfg.snap_len,
        cfg.capture_filter.as_deref(),
    ) {
        Ok(opened) => opened,
        Err(err) => {
            error!(%err, interface = %cfg.monitor_interface, "failed to open capture");
            std::process::exit(1);
        }
    };
    info!(interface = %cfg.monitor_interface, ?link_type, "capture opened");

    let shutdown = Arc::new(AtomicBool::new(false));
    let ctrlc_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received interrupt, shutting down");
            ctrlc_shutdown.store(true, Ordering::Relaxed);
        }
    });

    let run_cfg = cfg.clone();
    let run_store = Arc::clone(&store);
    let run_sink = Arc::clone(&sink);
    let result = tokio::task::spawn_blocking(move || {
        capture::run(&run_cfg, cap, link_type, run_store, run_sink, shutdown)
    })
    .await;

    match result {
        Ok(Ok(())) => std::process::exit(0),
        Ok(Err(err)) => {
            error!(%err, "capture loop exited with an error");
            std::process::exit(1);
        }
        Err(join_err) => {
            error!(error = %join_err, "capture task panicked");
            std::process::exit(1);
        }
    }
}

/// Reject the literal device name `"any"` on Windows — the pseudo-device
/// that aggregates every interface on Linux has no Windows equivalent
/// (spec §6).
fn validate_interface(name: &str) -> Result<(), &'static str> {
    if cfg!(windows) && name == "any" {
        return Err("the \"any\" pseudo-interface is not supported on Windows");
    }
    Ok(())
}

#[cfg(unix)]
fn check_privileges() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn check_privileges() -> bool {
    // Non-Unix targets have no portable euid check; the capture library's
    // own open() call will surface a permissions error if needed.
    true
}

fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
