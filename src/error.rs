//! Error types for configuration resolution.
//!
//! Every failure the configuration core can produce is a [`ConfigError`].
//! Callers decide what to do with it; the core never exits the process.
//! [`ConfigError::kind`] tells the command layer whether the user caused the
//! failure (bad file, bad value) or the system did (I/O, cache directory).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Broad classification used to pick the exit path and message style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Something the user can fix: a missing or malformed config file, a bad value.
    User,
    /// An operational failure: I/O, directory creation, misuse of the API.
    System,
}

/// Errors raised while registering, loading, resolving or reading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration has not been resolved yet")]
    NotResolved,

    #[error(
        "Unable to locate config file in {}. Perhaps you need to create a new site.\n       Run `drouet help new` for details.",
        dir.display()
    )]
    NotFound { dir: PathBuf },

    #[error(
        "Unable to locate config file {}. Perhaps you need to create a new site.\n       Run `drouet help new` for details.",
        path.display()
    )]
    MissingFile { path: PathBuf },

    #[error("Unable to parse config file ({}): {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Unable to read config file ({}): {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Unsupported config file format: {} (expected one of: toml, yaml, yml, json)",
        path.display()
    )]
    UnsupportedFormat { path: PathBuf },

    #[error("alias {alias:?} cannot refer to itself")]
    SelfAlias { alias: String },

    #[error("alias {alias:?} -> {canonical:?} would create a cycle")]
    AliasCycle { alias: String, canonical: String },

    #[error("default for {key:?} is already registered with a different value")]
    ConflictingDefault { key: String },

    #[error("{key} is {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{key} is not set")]
    MissingKey { key: String },

    #[error("invalid value {value:?} in {var}: expected {expected}")]
    InvalidEnv {
        var: String,
        value: String,
        expected: &'static str,
    },

    #[error("Unable to create cache directory {}: {source}", path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to determine working directory: {0}")]
    WorkingDir(#[source] io::Error),
}

impl ConfigError {
    pub fn parse(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn type_mismatch(key: &str, expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch {
            key: key.to_string(),
            expected,
            found,
        }
    }

    /// Classify this error for the command layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::NotFound { .. }
            | ConfigError::MissingFile { .. }
            | ConfigError::Parse { .. }
            | ConfigError::UnsupportedFormat { .. }
            | ConfigError::TypeMismatch { .. }
            | ConfigError::InvalidEnv { .. } => ErrorKind::User,
            ConfigError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                ErrorKind::User
            }
            ConfigError::Read { .. }
            | ConfigError::NotResolved
            | ConfigError::SelfAlias { .. }
            | ConfigError::AliasCycle { .. }
            | ConfigError::ConflictingDefault { .. }
            | ConfigError::MissingKey { .. }
            | ConfigError::CacheDir { .. }
            | ConfigError::WorkingDir(_) => ErrorKind::System,
        }
    }

    pub fn is_user_error(&self) -> bool {
        self.kind() == ErrorKind::User
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_user_error_with_hint() {
        let err = ConfigError::NotFound {
            dir: PathBuf::from("/site"),
        };
        assert!(err.is_user_error());
        assert!(err.to_string().contains("create a new site"));
    }

    #[test]
    fn test_cache_dir_failure_is_system_error() {
        let err = ConfigError::CacheDir {
            path: PathBuf::from("/nope"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.kind(), ErrorKind::System);
    }

    #[test]
    fn test_read_classification_depends_on_cause() {
        let missing = ConfigError::Read {
            path: PathBuf::from("extra.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let denied = ConfigError::Read {
            path: PathBuf::from("extra.toml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(missing.kind(), ErrorKind::User);
        assert_eq!(denied.kind(), ErrorKind::System);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = ConfigError::parse("/site/extra.yaml", "bad indentation");
        let msg = err.to_string();
        assert!(msg.contains("/site/extra.yaml"));
        assert!(msg.contains("bad indentation"));
    }
}
