//! Error types for debouncer construction and configuration

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while building a debouncer or loading its configuration
///
/// The debouncer itself never fails once constructed; every variant here is
/// raised before the first observation.
#[derive(Debug, Error)]
pub enum DebounceError {
    /// No tokio runtime is running on the current thread
    #[error("no tokio runtime available to schedule debounce timers")]
    NoRuntime,

    /// Configuration file could not be read
    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`crate::DebounceConfig`]
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Delay is outside the accepted range
    #[error("invalid delay: {delay_ms}ms (must be at most {max_ms}ms)")]
    InvalidDelay { delay_ms: u64, max_ms: u64 },
}

/// Result type for debounce operations
pub type Result<T> = std::result::Result<T, DebounceError>;
