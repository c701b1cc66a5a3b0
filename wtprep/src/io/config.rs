//! Optional tool configuration stored at `<repo>/.wtprep.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// File name looked up in the repository root.
pub const CONFIG_FILE: &str = ".wtprep.toml";

/// Tool configuration (TOML).
///
/// Every field has a default, so a missing file and an empty file behave the
/// same.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PrepConfig {
    /// Wall-clock limit per external command in seconds. `0` waits forever.
    pub command_timeout_secs: u64,

    /// Bytes of stdout/stderr kept per command; the rest is drained and dropped.
    pub output_limit_bytes: usize,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 0,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl PrepConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        match self.command_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PrepConfig::default()`.
pub fn load_config(path: &Path) -> Result<PrepConfig> {
    if !path.exists() {
        return Ok(PrepConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PrepConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid {}", path.display()))?;
    Ok(cfg)
}
