//! Logging setup and the de-duplicating logger.
//!
//! The binary installs one `tracing` subscriber at startup through [`init`].
//! Library code logs with the `tracing` macros directly, except for messages
//! that may be triggered many times per run (deprecations, repeated content
//! problems), which go through a [`DistinctLogger`].

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Logging switches taken from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub quiet: bool,
    pub debug: bool,
    pub verbose: bool,
    /// Log to a file (a temp file unless `log_file` is given).
    pub log: bool,
    pub verbose_log: bool,
    pub log_file: Option<PathBuf>,
}

impl LogOptions {
    /// Console threshold: quiet shows only errors, debug wins over verbose.
    pub fn level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else if self.debug {
            Level::DEBUG
        } else if self.verbose || self.verbose_log {
            Level::INFO
        } else {
            Level::WARN
        }
    }

    /// Destination file, if output goes to a file instead of stderr.
    pub fn log_path(&self) -> Option<PathBuf> {
        match &self.log_file {
            Some(path) => Some(path.clone()),
            None if self.log || self.verbose_log => Some(
                std::env::temp_dir().join(format!("drouet-{}.log", std::process::id())),
            ),
            None => None,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the computed level.
///
/// Returns the log file in use, if any.
pub fn init(options: &LogOptions) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(options.level()).into())
        .from_env_lossy();

    match options.log_path() {
        Some(path) => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(Some(path))
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(None)
        }
    }
}

/// Logs each distinct message once.
///
/// Constructed explicitly and shared by reference or `Arc`; every instance
/// has its own memory of what it already printed.
#[derive(Debug)]
pub struct DistinctLogger {
    level: Level,
    seen: Mutex<HashSet<String>>,
}

impl DistinctLogger {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn warn() -> Self {
        Self::new(Level::WARN)
    }

    pub fn error() -> Self {
        Self::new(Level::ERROR)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Emit `message` unless an identical one was emitted before.
    /// Returns `true` if it was emitted now.
    pub fn print(&self, message: &str) -> bool {
        let message = message.trim();
        let first_time = self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(message.to_string());
        if !first_time {
            return false;
        }

        match self.level {
            Level::ERROR => tracing::error!("{}", message),
            Level::WARN => tracing::warn!("{}", message),
            Level::INFO => tracing::info!("{}", message),
            Level::DEBUG => tracing::debug!("{}", message),
            Level::TRACE => tracing::trace!("{}", message),
        }
        true
    }

    /// Number of distinct messages printed so far.
    pub fn count(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
