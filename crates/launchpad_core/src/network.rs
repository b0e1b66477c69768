use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Networks the launchpad knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Sepolia,
    Localhost,
}

impl Network {
    /// Human-readable label for the network.
    pub fn label(&self) -> &'static str {
        match self {
            Network::Sepolia => "Sepolia",
            Network::Localhost => "Localhost",
        }
    }

    /// Short name used for deployment directories and CLI flags.
    pub fn slug(&self) -> &'static str {
        match self {
            Network::Sepolia => "sepolia",
            Network::Localhost => "localhost",
        }
    }

    /// EVM chain ID.
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Sepolia => 11_155_111,
            Network::Localhost => 31_337,
        }
    }

    /// Whether this is a public test network (as opposed to a local dev node).
    pub fn is_public(&self) -> bool {
        matches!(self, Network::Sepolia)
    }

    pub fn all() -> [Network; 2] {
        [Network::Sepolia, Network::Localhost]
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sepolia" => Ok(Network::Sepolia),
            "localhost" | "hardhat" | "local" => Ok(Network::Localhost),
            other => Err(format!("unknown network: {other}")),
        }
    }
}

/// Static per-network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub explorer_url: Option<String>,
}

/// Built-in defaults for every supported network.
pub fn get_network_configs() -> HashMap<Network, NetworkConfig> {
    let mut configs = HashMap::new();

    configs.insert(
        Network::Sepolia,
        NetworkConfig {
            name: "Sepolia".to_string(),
            chain_id: 11_155_111,
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            explorer_url: Some("https://sepolia.etherscan.io".to_string()),
        },
    );

    configs.insert(
        Network::Localhost,
        NetworkConfig {
            name: "Localhost".to_string(),
            chain_id: 31_337,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            explorer_url: None,
        },
    );

    configs
}
