//! Provider configuration
//!
//! Loaded from YAML. The first existing file wins:
//! 1. `TIDEMARK_CONFIG_PATH` (direct path)
//! 2. `./tidemark.yaml`
//! 3. `~/.config/tidemark/config.yaml`
//!
//! Without any file the defaults apply. `AWS_REGION` (or
//! `AWS_DEFAULT_REGION`) overrides the configured region.

use crate::error::{CloudError, Result};
use crate::provider::Timeouts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_PATH_ENV: &str = "TIDEMARK_CONFIG_PATH";
const LOCAL_CONFIG_FILE: &str = "tidemark.yaml";
const KNOWN_PARTITIONS: &[&str] = &["aws", "aws-cn", "aws-us-gov", "aws-iso", "aws-iso-b"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub region: String,
    pub partition: String,
    pub timeouts: TimeoutSettings,
    /// Seconds to wait before the first status check after a mutating call
    pub poll_delay_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            partition: "aws".to_string(),
            timeouts: TimeoutSettings::default(),
            poll_delay_secs: 30,
        }
    }
}

/// Default operation timeouts in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub create_secs: u64,
    pub read_secs: u64,
    pub update_secs: u64,
    pub delete_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            create_secs: 20 * 60,
            read_secs: 20 * 60,
            update_secs: 20 * 60,
            delete_secs: 20 * 60,
        }
    }
}

impl TimeoutSettings {
    pub fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            create: Duration::from_secs(self.create_secs),
            read: Duration::from_secs(self.read_secs),
            update: Duration::from_secs(self.update_secs),
            delete: Duration::from_secs(self.delete_secs),
        }
    }
}

impl ProviderConfig {
    /// Locate, parse, override from the environment and validate
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => {
                tracing::debug!("Loading provider config from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                tracing::debug!("No provider config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply `AWS_REGION` / `AWS_DEFAULT_REGION`
    pub fn apply_env(&mut self) {
        let region = std::env::var("AWS_REGION")
            .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
            .ok()
            .filter(|r| !r.is_empty());

        if let Some(region) = region {
            self.region = region;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(CloudError::InvalidConfig("region must not be empty".to_string()));
        }

        if !KNOWN_PARTITIONS.contains(&self.partition.as_str()) {
            return Err(CloudError::InvalidConfig(format!(
                "unknown partition '{}', expected one of {:?}",
                self.partition, KNOWN_PARTITIONS
            )));
        }

        let t = &self.timeouts;
        if [t.create_secs, t.read_secs, t.update_secs, t.delete_secs].contains(&0) {
            return Err(CloudError::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Find the provider config file, if any
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let path = current_dir.join(LOCAL_CONFIG_FILE);
        if path.exists() {
            return Some(path);
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("tidemark").join("config.yaml"))
        .filter(|path| path.exists())
}
