use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use cf_core::FunnelError;
use tracing_subscriber::EnvFilter;

use crate::map_cli_log_file;

pub(crate) const LOG_ENV: &str = "CHATFUNNEL_LOG";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LogTarget {
    Stderr,
    File(String),
    /// Full-screen mode owns the terminal; log lines would corrupt it.
    Sink,
}

impl LogTarget {
    /// `--log-file` wins over the mode's own default.
    pub(crate) fn pick(log_file: Option<&str>, fallback: LogTarget) -> Self {
        match log_file {
            Some(path) => Self::File(path.to_string()),
            None => fallback,
        }
    }
}

pub(crate) fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber. A second call keeps the first one.
pub(crate) fn init_logging(target: &LogTarget) -> Result<(), FunnelError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(true);
    let installed = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::Sink => builder.with_writer(std::io::sink).try_init(),
        LogTarget::File(path) => {
            let file = open_log_file(Path::new(path))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    if installed.is_err() {
        tracing::debug!("log subscriber already installed");
    }
    Ok(())
}

pub(crate) fn open_log_file(path: &Path) -> Result<File, FunnelError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(map_cli_log_file)?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(map_cli_log_file)
}
