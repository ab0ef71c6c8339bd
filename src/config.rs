use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{AmountPolicy, RoundingRule};

/// Default configuration file, resolved against the current working directory.
pub const DEFAULT_CONFIG_PATH: &str = "reckoning.toml";

/// Process-wide settings, read from a TOML file.
///
/// ```toml
/// log_level = "info"
///
/// [ledger]
/// rounding = "half-down"
/// amount_policy = "non-negative"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Default tracing filter; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub ledger: LedgerSettings,
}

/// Rules applied by the ledger when it mutates a balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerSettings {
    #[serde(default)]
    pub rounding: RoundingRule,

    #[serde(default)]
    pub amount_policy: AmountPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            ledger: LedgerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Parse a configuration document.
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).context("Invalid configuration")
    }

    /// Load configuration from `path`, falling back to defaults when the file does not exist.
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&source).with_context(|| format!("Failed to load {}", path.display()))
    }
}
