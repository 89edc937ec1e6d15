//! Tracing subscriber setup shared by the `finder` and `labeler` binaries.
//!
//! Console output goes to stderr; the same events are appended to a log file.
//! `RUST_LOG` takes precedence over the `-v`/`-vv` flags when it parses.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::constants::logging::DEFAULT_LOG_FILE;
use crate::errors::LabelerError;

/// Verbosity derived from repeated `-v` flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Errors only.
    #[default]
    Default,
    /// `-v` / `--verbose`: informational messages.
    Verbose,
    /// `-vv`: diagnostic messages, including skipped files.
    Diagnostic,
}

impl Verbosity {
    /// Map a `-v` occurrence count to a verbosity.
    pub const fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Default,
            1 => Self::Verbose,
            _ => Self::Diagnostic,
        }
    }

    /// Maximum level emitted at this verbosity.
    pub const fn level(self) -> Level {
        match self {
            Self::Default => Level::ERROR,
            Self::Verbose => Level::INFO,
            Self::Diagnostic => Level::DEBUG,
        }
    }
}

/// Logging options handed to [`init_logging`] by the binaries.
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Console and file verbosity.
    pub verbosity: Verbosity,
    /// Append-only log file; `None` disables the file layer.
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Default,
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

/// Install the process subscriber. A second call keeps the first subscriber.
pub fn init_logging(config: &LogConfig) -> Result<(), LabelerError> {
    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    if let Err(err) = tracing_subscriber::registry()
        .with(build_env_filter(config.verbosity))
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        debug!(error = %err, "subscriber already installed, keeping it");
    }
    Ok(())
}

/// `RUST_LOG` when set and valid, otherwise the verbosity's level.
pub fn build_env_filter(verbosity: Verbosity) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::default().add_directive(verbosity.level().into())
}
