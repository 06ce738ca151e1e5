use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level permastore configuration stored as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub arweave: ArweaveConfig,
    #[serde(default)]
    pub ipfs: IpfsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArweaveConfig {
    /// Gateway base URL.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Path to the wallet file (owner + RSA private key PEM).
    pub wallet_path: String,
    /// Directory holding upload checkpoints.
    pub checkpoint_dir: String,
    /// Chunks transmitted per upload pass before checkpointing.
    /// `None` runs to completion in a single pass.
    #[serde(default)]
    pub chunks_per_pass: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpfsConfig {
    /// IPFS node HTTP API base URL.
    pub api_url: String,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5001".to_string(),
        }
    }
}

fn default_gateway_url() -> String {
    "https://arweave.net".to_string()
}

impl StoreConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StoreError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| StoreError::TomlDe(e.to_string()))
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| StoreError::TomlSer(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config for `permastore init`.
    pub fn default_config(base_dir: &Path) -> Self {
        Self {
            arweave: ArweaveConfig {
                gateway_url: default_gateway_url(),
                wallet_path: base_dir.join("wallet.json").display().to_string(),
                checkpoint_dir: base_dir.join("checkpoints").display().to_string(),
                chunks_per_pass: None,
            },
            ipfs: IpfsConfig::default(),
        }
    }

    /// Resolve the config file path: `<base_dir>/permastore.toml`
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join("permastore.toml")
    }

    /// Resolve the default permastore home directory: `~/.permastore`
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".permastore"))
            .ok_or_else(|| StoreError::Config("Cannot determine home directory".to_string()))
    }
}
