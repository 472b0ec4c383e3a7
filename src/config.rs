use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ClientConfig;
use crate::application::DEFAULT_MAX_CONCURRENT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Batch settings, loadable from a TOML file.
///
/// ```toml
/// max_concurrent = 3
///
/// [http]
/// timeout_secs = 7200
/// connect_timeout_secs = 30
/// user_agent = "launcher/1.0"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Validated at submit time; zero or negative is rejected.
    pub max_concurrent: i64,
    pub http: ClientConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            http: ClientConfig::default(),
        }
    }
}

/// Load configuration from `path`. A missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<ManagerConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(ManagerConfig::default());
    }
    let data = fs::read_to_string(path)?;
    let cfg: ManagerConfig = toml::from_str(&data)?;
    Ok(cfg)
}
