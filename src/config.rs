// voxbox configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_BACKEND: &str = "auto";
const DEFAULT_CLOUD_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub offline: OfflineConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to serve the UI and API on; VOXBOX_HTTP_PORT overrides it.
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Offline backend: "auto", "espeak", "say" or "mock".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Explicit path to the synthesis binary, bypassing discovery.
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// Directory for scratch audio files (system temp dir when unset).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Override the cloud synthesis endpoint (scheme + host), mainly useful
    /// for pointing the client at a stub during development.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-request timeout for the cloud service.
    #[serde(default = "default_cloud_timeout")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

fn default_cloud_timeout() -> u64 {
    DEFAULT_CLOUD_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
        }
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        OfflineConfig {
            backend: default_backend(),
            binary: None,
            temp_dir: None,
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        CloudConfig {
            endpoint: None,
            timeout_secs: default_cloud_timeout(),
        }
    }
}

impl AppConfig {
    /// Config file location: `<config_dir>/voxbox/config.toml`.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("voxbox").join("config.toml"))
    }

    /// Load config from file, returning defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
