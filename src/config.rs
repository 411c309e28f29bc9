//! Configuration handling for cxxsig

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use cxxsig_core::error::CxxsigError;
use cxxsig_cpp::ops::FormatOptions;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "cxxsig.toml";

/// cxxsig configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Formatting of generated argument and parameter lists
    #[serde(default)]
    pub format: FormatOptions,

    /// JSON output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// JSON output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print responses (compact single-line JSON otherwise)
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, CxxsigError> {
        let content = fs::read_to_string(path).map_err(|e| CxxsigError::Config {
            message: format!("failed to read config file {}: {}", path.display(), e),
        })?;
        toml::from_str(&content).map_err(|e| CxxsigError::Config {
            message: format!("failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Load `cxxsig.toml` from the given directory, or defaults if absent
    pub fn load_from_dir(dir: &Path) -> Result<Self, CxxsigError> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Config::default())
        }
    }
}
