//! Tracing subscriber setup for the `foesmm` binary.
//!
//! Events go to a daily rolling file `<log_dir>/foesmm.<date>`, plain text or JSON lines,
//! plus an optional ANSI console layer. Library code logs detection with structured
//! fields (`game`, `channel`, `source`, `path`) so both formats stay greppable per game.

use crate::models::Settings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix of the rolling log files
pub const LOG_FILE_PREFIX: &str = "foesmm";

/// Where and how to log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    pub dir: Utf8PathBuf,
    pub debug: bool,
    pub console: bool,
    pub json: bool,
}

impl LogOptions {
    /// Options from user settings, with console output enabled.
    ///
    /// A relative `log_dir` lives inside `config_dir`, next to `Settings.yaml`.
    pub fn from_settings(settings: &Settings, config_dir: &Utf8Path) -> Self {
        Self {
            dir: resolve_log_dir(config_dir, &settings.log_dir),
            debug: settings.debug_mode,
            console: true,
            json: settings.json_logs,
        }
    }
}

/// `log_dir` if absolute, otherwise `config_dir/log_dir`
pub fn resolve_log_dir(config_dir: &Utf8Path, log_dir: &str) -> Utf8PathBuf {
    let log_dir = Utf8Path::new(log_dir);
    if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        config_dir.join(log_dir)
    }
}

/// Install the global subscriber.
///
/// The level is `debug` or `info` depending on `options.debug`; `RUST_LOG` directives
/// take precedence. Keep the returned guard alive until exit or buffered lines are lost.
///
/// # Errors
/// Fails if the log folder cannot be created or a global subscriber is already set.
pub fn init(options: &LogOptions) -> Result<WorkerGuard> {
    ensure_log_dir(&options.dir)?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&options.dir, LOG_FILE_PREFIX));

    let file_layer: Box<dyn Layer<Registry> + Send + Sync> = if options.json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    };
    let console_layer = options.console.then(|| fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(level_filter(options.debug))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        dir = %options.dir,
        debug = options.debug,
        json = options.json,
        "logging initialized"
    );

    Ok(guard)
}

fn ensure_log_dir(dir: &Utf8Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory: {}", dir))
}

fn level_filter(debug: bool) -> EnvFilter {
    let level = if debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
    EnvFilter::builder().with_default_directive(level.into()).from_env_lossy()
}
