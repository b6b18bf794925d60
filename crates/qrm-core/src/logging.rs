//! Tracing subscriber setup.
//!
//! The filter comes from `QRM_LOG` (e.g. `QRM_LOG=qrm_core=debug`). The TUI owns
//! the terminal, so it logs to `$QRM_HOME/logs/qrm.log`; every other command
//! logs to stderr.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::paths;

const LOG_ENV: &str = "QRM_LOG";
const LOG_FILE: &str = "qrm.log";

/// Where log lines go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr { default_filter: &'static str },
    File { dir: PathBuf },
}

impl LogTarget {
    /// File target under `$QRM_HOME/logs`.
    pub fn default_file() -> Self {
        LogTarget::File {
            dir: paths::logs_dir(),
        }
    }
}

/// Keeps the background writer alive; drop it last to flush pending lines.
#[must_use = "dropping the guard stops the log writer"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Installs the global subscriber.
///
/// Calling this twice is harmless: the second installation is ignored.
///
/// # Errors
/// Returns an error if the log directory cannot be created.
pub fn init(target: LogTarget) -> Result<LogGuard> {
    match target {
        LogTarget::Stderr { default_filter } => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter(default_filter))
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init();
            Ok(LogGuard { _worker: None })
        }
        LogTarget::File { dir } => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
            let (writer, worker) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter("info"))
                .with_writer(writer)
                .with_ansi(false)
                .try_init();
            Ok(LogGuard {
                _worker: Some(worker),
            })
        }
    }
}

/// Masks an API key for logs and display: first four characters, then `…`.
pub fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}…")
    }
}
