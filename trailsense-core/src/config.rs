use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SensorError};

/// Sensor configuration, loaded from a TOML file.
///
/// Field names match the keys recognized in spec §6, plus the ambient keys
/// every production crate in this corpus carries (log directory, buffer
/// sizing, logging level) — see `SPEC_FULL.md`'s "Ambient config additions".
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Device name to monitor. The literal `"any"` is rejected on Windows by
    /// the CLI layer (spec §6) — this struct does not know the host OS.
    pub monitor_interface: String,
    /// Optional BPF filter expression applied to the capture.
    #[serde(default)]
    pub capture_filter: Option<String>,
    /// Enable the multi-worker ring-buffer pipeline when the host has more
    /// than one CPU. When `false` or the host is single-core, capture runs
    /// in inline mode (`workers = 0`).
    #[serde(default = "default_use_multiprocessing")]
    pub use_multiprocessing: bool,
    /// Seconds between trail refreshes.
    #[serde(default = "default_update_period_secs")]
    pub update_period_secs: u64,
    /// Remote source for fresh trail tables.
    pub server_update: String,
    /// Local cache path used when `server_update` is unreachable and no
    /// snapshot has ever been installed.
    #[serde(default = "default_trail_cache_path")]
    pub trail_cache_path: PathBuf,
    /// Directory alert log files are written under.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Capture snapshot length passed to the link driver.
    #[serde(default = "default_snap_len")]
    pub snap_len: i32,
    /// Number of slots in the ring buffer.
    #[serde(default = "default_buffer_length")]
    pub buffer_length: usize,
    /// NXDOMAIN-per-hour threshold before the heuristic alert fires.
    #[serde(default = "default_no_such_name_per_hour_threshold")]
    pub no_such_name_per_hour_threshold: u32,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_use_multiprocessing() -> bool {
    true
}

fn default_update_period_secs() -> u64 {
    3600
}

fn default_trail_cache_path() -> PathBuf {
    PathBuf::from("trails.csv")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_snap_len() -> i32 {
    65535
}

fn default_buffer_length() -> usize {
    4096
}

fn default_no_such_name_per_hour_threshold() -> u32 {
    10
}

/// Read, parse, and validate a configuration file (spec §6).
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let text = std::fs::read_to_string(path.as_ref()).map_err(SensorError::Io)?;
    let cfg: Config = toml::from_str(&text)
        .map_err(|e| SensorError::Config(format!("failed to parse config: {e}")))?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<()> {
    if cfg.monitor_interface.trim().is_empty() {
        return Err(SensorError::Config("monitor_interface must not be empty".into()));
    }
    if cfg.server_update.trim().is_empty() {
        return Err(SensorError::Config("server_update must not be empty".into()));
    }
    if cfg.buffer_length == 0 {
        return Err(SensorError::Config("buffer_length must be > 0".into()));
    }
    Ok(())
}
