//! Debounce configuration
//!
//! Loaded from the `[debounce]` table of a TOML file, or parsed directly:
//!
//! ```toml
//! delay_ms = 300
//! ```

use crate::error::{DebounceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound for a configured delay (1 hour)
pub const MAX_DELAY_MS: u64 = 60 * 60 * 1000;

/// Default quiescence window
pub const DEFAULT_DELAY_MS: u64 = 300;

/// Debouncer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiescence window in milliseconds (default: 300)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl DebounceConfig {
    /// Config with the given delay in milliseconds
    pub fn with_delay_ms(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    /// Configured delay as a [`Duration`]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Check that all values are within their valid ranges
    pub fn validate(&self) -> Result<()> {
        if self.delay_ms > MAX_DELAY_MS {
            return Err(DebounceError::InvalidDelay {
                delay_ms: self.delay_ms,
                max_ms: MAX_DELAY_MS,
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    ///
    /// A negative `delay_ms` does not fit the unsigned field and is reported
    /// as a parse error.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| DebounceError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_for_empty_document() {
        let config = DebounceConfig::from_toml_str("").unwrap();
        assert_eq!(config, DebounceConfig::default());
        assert_eq!(config.delay(), Duration::from_millis(300));
    }

    #[test]
    fn test_parse_delay() {
        let config = DebounceConfig::from_toml_str("delay_ms = 500\n").unwrap();
        assert_eq!(config.delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_delay_is_valid() {
        let config = DebounceConfig::from_toml_str("delay_ms = 0\n").unwrap();
        assert_eq!(config.delay(), Duration::ZERO);
    }

    #[test]
    fn test_negative_delay_rejected() {
        let err = DebounceConfig::from_toml_str("delay_ms = -5\n").unwrap_err();
        assert!(matches!(err, DebounceError::ConfigParse(_)));
    }

    #[test]
    fn test_delay_over_limit_rejected() {
        let err = DebounceConfig::with_delay_ms(MAX_DELAY_MS + 1)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            DebounceError::InvalidDelay { delay_ms, max_ms }
                if delay_ms == MAX_DELAY_MS + 1 && max_ms == MAX_DELAY_MS
        ));

        assert!(DebounceConfig::with_delay_ms(MAX_DELAY_MS).validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("debounce.toml");
        fs::write(&path, "delay_ms = 250\n").unwrap();

        let config = DebounceConfig::load(&path).unwrap();
        assert_eq!(config.delay_ms, 250);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.toml");

        let err = DebounceConfig::load(&path).unwrap_err();
        assert!(matches!(err, DebounceError::ConfigRead { .. }));
        assert!(err.to_string().contains("missing.toml"));
    }
}
