use std::collections::HashMap;
use std::time::Duration;

use launchpad_core::{Network, get_network_configs, validate_url};
use serde::{Deserialize, Serialize};

/// Configuration for a single RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub network: Network,
    pub url: String,
    pub is_custom: bool,
    pub timeout_secs: u64,
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Per-network RPC endpoint configuration with custom override support.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfigStore {
    configs: HashMap<Network, RpcConfig>,
}

impl RpcConfigStore {
    /// Create a store populated with the built-in endpoint of every network.
    pub fn with_defaults() -> Self {
        let configs = get_network_configs()
            .into_iter()
            .map(|(network, nc)| {
                let rpc = RpcConfig {
                    network,
                    url: nc.rpc_url,
                    is_custom: false,
                    timeout_secs: DEFAULT_TIMEOUT_SECS,
                };
                (network, rpc)
            })
            .collect();

        Self { configs }
    }

    pub fn get_rpc(&self, network: Network) -> Option<&RpcConfig> {
        self.configs.get(&network)
    }

    /// Override the RPC URL for a network with a custom endpoint.
    pub fn set_custom_rpc(&mut self, network: Network, url: String) -> anyhow::Result<()> {
        if !validate_url(&url) {
            anyhow::bail!("invalid RPC URL: {url}");
        }

        let entry = self.entry(network);
        entry.url = url;
        entry.is_custom = true;
        Ok(())
    }

    /// Set the per-request timeout for a network.
    pub fn set_timeout(&mut self, network: Network, timeout_secs: u64) {
        self.entry(network).timeout_secs = timeout_secs.max(1);
    }

    /// Reset a network's RPC URL back to the built-in default.
    pub fn reset_to_default(&mut self, network: Network) {
        if let Some(default_config) = get_network_configs().remove(&network) {
            let entry = self.entry(network);
            entry.url = default_config.rpc_url;
            entry.is_custom = false;
        }
    }

    fn entry(&mut self, network: Network) -> &mut RpcConfig {
        self.configs.entry(network).or_insert_with(|| RpcConfig {
            network,
            url: String::new(),
            is_custom: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }
}

impl Default for RpcConfigStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}
