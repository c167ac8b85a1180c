use std::{fs, path::Path, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    25
}

fn default_refresh_interval_secs() -> u64 {
    15
}

fn default_corrected_limit() -> u32 {
    100
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./tier5-state.json")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as `X-Reviewer-ID` on every request.
    #[serde(default)]
    pub reviewer_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            reviewer_id: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedConfig {
    #[serde(default = "default_corrected_limit")]
    pub limit: u32,
}

impl Default for CorrectedConfig {
    fn default() -> Self {
        Self {
            limit: default_corrected_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Daily-rolling log directory; stdout only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub pending: PendingConfig,
    #[serde(default)]
    pub corrected: CorrectedConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

pub fn load_config(path: &Path) -> Result<ConsoleConfig> {
    let config: ConsoleConfig = read_yaml_file(path)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &ConsoleConfig) -> Result<()> {
    if config.api.base_url.trim().is_empty() {
        return Err(anyhow!("api.base_url must not be empty"));
    }
    if config.pending.page_size == 0 {
        return Err(anyhow!("pending.page_size must be greater than zero"));
    }
    if config.pending.refresh_interval_secs == 0 {
        return Err(anyhow!("pending.refresh_interval_secs must be greater than zero"));
    }
    Ok(())
}

fn read_yaml_file<T>(path: &Path) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse yaml file: {}", path.display()))
}
