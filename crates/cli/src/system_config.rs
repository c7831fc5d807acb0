//! CLI configuration file
//!
//! Lives at `$XDG_CONFIG_HOME/debounce/config.toml` unless `--config` points
//! elsewhere. Missing file means defaults.

use anyhow::{Context, Result};
use debounce::DebounceConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Full CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub debounce: DebounceConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Output behaviour for `debounce run`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Commit pending values immediately at end of input (default: true)
    #[serde(default = "default_true")]
    pub flush_on_eof: bool,

    /// Key/value separator for keyed mode (default: tab)
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            flush_on_eof: true,
            separator: default_separator(),
        }
    }
}

impl CliConfig {
    /// Check all values are within their valid ranges
    pub fn validate(&self) -> Result<()> {
        self.debounce.validate()?;
        if self.output.separator.is_empty() {
            anyhow::bail!("output.separator must not be empty");
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_separator() -> String {
    "\t".to_string()
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("debounce").join("config.toml"))
}

/// Load configuration from `explicit`, or from the default location
///
/// An explicit path must exist; the default location is optional.
pub fn load(explicit: Option<&Path>) -> Result<CliConfig> {
    match explicit {
        Some(path) => load_from(path),
        None => match config_file_path() {
            Some(path) if path.exists() => load_from(&path),
            _ => Ok(CliConfig::default()),
        },
    }
}

/// Read, parse and validate a config file
pub fn load_from(path: &Path) -> Result<CliConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config.validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Write the example config to the default location if nothing is there
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path()
        .context("Could not determine config file path")?;

    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }
        std::fs::write(&path, example_config())
            .context("Failed to write config file")?;
    }

    Ok(path)
}

/// Example config with every key at its default
pub fn example_config() -> &'static str {
    r#"# debounce configuration

[debounce]
# Quiescence window in milliseconds (0-3600000)
delay_ms = 300

[output]
# Commit pending values immediately at end of input
flush_on_eof = true
# Key/value separator for --keyed
separator = "\t"
"#
}
