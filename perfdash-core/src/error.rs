/// Structured error types for perfdash-core.
///
/// Uses `thiserror` for better API surface and error composition.
/// Binary crates (perfdash-cli) can still use `anyhow` for convenience,
/// but library consumers get structured, composable errors.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for perfdash-core operations
#[derive(Error, Debug)]
pub enum DashboardError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Configuration file could not be read or parsed
    #[error("Invalid config file: {source}")]
    ConfigParse {
        #[from]
        source: config::ConfigError,
    },

    /// A config key held a value of the wrong type
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// A VCS metadata file (HEAD or the ref it points to) was unreadable.
    ///
    /// Deliberately not a fallback: when GIT is configured, a broken ref
    /// must surface instead of silently using APP_VERSION.
    #[error("Cannot read VCS ref {path:?}: {source}")]
    VcsRef { path: PathBuf, source: io::Error },
}

/// Result type alias for perfdash-core operations
pub type Result<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    /// Create an invalid value error
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a VCS ref error
    pub fn vcs_ref(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::VcsRef {
            path: path.into(),
            source,
        }
    }
}
