use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kindred_core::CoreConfig;
use serde::{Deserialize, Serialize};

/// Directory name under the platform data dir
const APP_DIR: &str = "kindred";

/// CLI configuration that can be loaded from a JSON file.
/// Every field is optional; command-line flags win over the file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Whose notification list to operate on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_cap: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the engine config, applying flag overrides on top of the file.
    pub fn resolve(&self, data_dir: Option<PathBuf>, user_id: Option<String>) -> CoreConfig {
        let data_dir = data_dir
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(default_data_dir);
        let mut config = CoreConfig::new(data_dir);
        if let Some(user_id) = user_id.or_else(|| self.user_id.clone()) {
            config = config.with_user_id(user_id);
        }
        if let Some(cap) = self.daily_cap {
            config = config.with_daily_cap(cap);
        }
        if let Some(ttl) = self.ttl_secs {
            config = config.with_ttl_secs(ttl);
        }
        config
    }
}

/// Platform data dir (e.g. `~/.local/share/kindred`), else `./kindred_data`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| CoreConfig::default().data_dir)
}
