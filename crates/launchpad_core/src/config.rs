use std::path::{Path, PathBuf};

use alloy_primitives::{Address, address};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::network::Network;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Relayer
// ---------------------------------------------------------------------------

/// Where user-decryption requests are sent and which contracts authorize them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayerConfig {
    pub relayer_url: String,
    /// Chain hosting the confidential token contracts.
    pub chain_id: u64,
    /// Chain the decryption gateway signs for. Used as the typed-data domain chain.
    pub gateway_chain_id: u64,
    /// Verifying contract of the `Decryption` typed-data domain.
    pub verifying_contract: Address,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            relayer_url: "http://127.0.0.1:3000".into(),
            chain_id: Network::Sepolia.chain_id(),
            gateway_chain_id: 55_815,
            verifying_contract: address!("b6E160B1ff80D67Bfe90A85eE06Ce0A2613607D1"),
        }
    }
}

// ---------------------------------------------------------------------------
// LaunchpadConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.launchpad/config.json`.
///
/// A `factory_address` equal to the zero address means the factory has not
/// been deployed/configured yet; every write flow is gated on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchpadConfig {
    pub network: Network,
    /// Custom RPC endpoint. `None` uses the network default.
    pub rpc_url: Option<String>,
    pub factory_address: Address,
    /// Preferred account. `None` picks the first account the wallet exposes.
    pub account: Option<Address>,
    pub relayer: RelayerConfig,
    pub receipt_poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub deployments_dir: PathBuf,
    pub artifact_path: PathBuf,
    pub log_level: String,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            network: Network::Sepolia,
            rpc_url: None,
            factory_address: Address::ZERO,
            account: None,
            relayer: RelayerConfig::default(),
            receipt_poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            deployments_dir: PathBuf::from("deployments"),
            artifact_path: PathBuf::from("artifacts/contracts/TokenFactory.sol/TokenFactory.json"),
            log_level: "info".into(),
        }
    }
}

impl LaunchpadConfig {
    /// Returns the base config directory: `~/.launchpad/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".launchpad"))
    }

    /// Returns the config file path: `~/.launchpad/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.launchpad/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Load config from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Corrupt config file: {}", path.display()))
    }

    /// Load config from a JSON file, or return defaults if the file is missing
    /// or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!(path = %path.display(), "config loaded");
                config
            }
            Err(e) => {
                warn!("{e:#}, using defaults");
                Self::default()
            }
        }
    }

    /// Save the config to a JSON file, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Whether a factory address has been configured.
    pub fn factory_configured(&self) -> bool {
        self.factory_address != Address::ZERO
    }

    /// Check values that would otherwise only fail deep inside a flow.
    pub fn validate(&self) -> Result<()> {
        if let Some(rpc) = self.rpc_url.as_ref().filter(|u| !u.trim().is_empty()) {
            if !validate_url(rpc) {
                anyhow::bail!("invalid RPC URL: {rpc}");
            }
        }
        if !validate_url(&self.relayer.relayer_url) {
            anyhow::bail!("invalid relayer URL: {}", self.relayer.relayer_url);
        }
        if self.receipt_poll_interval_secs == 0 {
            anyhow::bail!("receipt_poll_interval_secs must be at least 1");
        }
        Ok(())
    }
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_unconfigured_sepolia() {
        let config = LaunchpadConfig::default();
        assert_eq!(config.network, Network::Sepolia);
        assert!(!config.factory_configured());
        assert_eq!(config.receipt_poll_interval_secs, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_rpc() {
        let config = LaunchpadConfig {
            rpc_url: Some("ftp://node.example.com".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let original = LaunchpadConfig {
            network: Network::Localhost,
            factory_address: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            ..Default::default()
        };
        original.save_to_file(&path).unwrap();

        let loaded = LaunchpadConfig::load_or_default(&path);
        assert_eq!(loaded.network, Network::Localhost);
        assert_eq!(loaded.factory_address, original.factory_address);
        assert!(loaded.factory_configured());
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = LaunchpadConfig::load_or_default(&path);
        assert_eq!(loaded.network, Network::Sepolia);
    }

    #[test]
    fn load_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(
            LaunchpadConfig::load(&path).unwrap().network,
            Network::Sepolia
        );

        std::fs::write(&path, "{ not json").unwrap();
        let err = LaunchpadConfig::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("Corrupt config file"), "{err}");
    }

    #[test]
    fn default_relayer_is_local() {
        let relayer = RelayerConfig::default();
        assert!(relayer.relayer_url.starts_with("http://127.0.0.1"));
        assert!(validate_url(&relayer.relayer_url));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "network": "localhost" }"#).unwrap();

        let loaded = LaunchpadConfig::load_or_default(&path);
        assert_eq!(loaded.network, Network::Localhost);
        assert_eq!(loaded.relayer, RelayerConfig::default());
    }

    #[test]
    fn validate_url_cases() {
        assert!(validate_url("https://rpc.example.com"));
        assert!(validate_url("http://127.0.0.1:8545"));
        assert!(!validate_url(""));
        assert!(!validate_url("file:///etc/passwd"));
    }
}
