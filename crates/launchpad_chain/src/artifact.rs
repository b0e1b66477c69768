//! Compiled contract artifacts and on-disk deployment records.

use std::path::{Path, PathBuf};

use alloy_primitives::{Address, B256, Bytes, keccak256};
use chrono::{DateTime, Utc};
use launchpad_core::Network;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ChainError;

/// Name under which the factory deployment is recorded.
pub const FACTORY_CONTRACT: &str = "TokenFactory";

/// A Hardhat-style compiled artifact: `{ contractName, abi, bytecode }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: serde_json::Value,
    pub bytecode: String,
}

impl ContractArtifact {
    pub fn load_from_file(path: &Path) -> Result<Self, ChainError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ChainError::Artifact(format!("cannot read artifact {}: {e}", path.display()))
        })?;
        let artifact: Self = serde_json::from_str(&json)?;
        if artifact.bytecode.trim_start_matches("0x").is_empty() {
            return Err(ChainError::Artifact(format!(
                "{} has no bytecode (abstract contract or interface?)",
                artifact.contract_name
            )));
        }
        Ok(artifact)
    }

    /// Creation bytecode as raw bytes.
    pub fn bytecode_bytes(&self) -> Result<Bytes, ChainError> {
        hex::decode(self.bytecode.trim_start_matches("0x"))
            .map(Bytes::from)
            .map_err(|e| ChainError::Artifact(format!("invalid bytecode hex: {e}")))
    }

    /// Keccak-256 of the creation bytecode, used to detect redeploys.
    pub fn bytecode_hash(&self) -> Result<B256, ChainError> {
        Ok(keccak256(self.bytecode_bytes()?))
    }
}

/// One deployed contract, in the layout hardhat-deploy writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: Address,
    pub transaction_hash: B256,
    pub block_number: u64,
    pub bytecode_hash: B256,
    pub deployed_at: DateTime<Utc>,
}

/// Deployment records under `<root>/<network>/<Contract>.json`.
#[derive(Debug, Clone)]
pub struct DeploymentStore {
    root: PathBuf,
}

impl DeploymentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn record_path(&self, network: Network, contract: &str) -> PathBuf {
        self.root.join(network.slug()).join(format!("{contract}.json"))
    }

    /// `Ok(None)` when nothing has been deployed yet.
    pub fn load(&self, network: Network, contract: &str) -> Result<Option<DeploymentRecord>, ChainError> {
        let path = self.record_path(network, contract);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn save(
        &self,
        network: Network,
        contract: &str,
        record: &DeploymentRecord,
    ) -> Result<PathBuf, ChainError> {
        let path = self.record_path(network, contract);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(record)?)?;
        info!(path = %path.display(), address = %record.address, "deployment recorded");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn write_artifact(dir: &Path, bytecode: &str) -> PathBuf {
        let path = dir.join("TokenFactory.json");
        let json = serde_json::json!({
            "contractName": "TokenFactory",
            "abi": [],
            "bytecode": bytecode,
            "deployedBytecode": "0x"
        });
        std::fs::write(&path, json.to_string()).unwrap();
        path
    }

    #[test]
    fn artifact_loads_and_decodes_bytecode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), "0x6080604052");

        let artifact = ContractArtifact::load_from_file(&path).unwrap();
        assert_eq!(artifact.contract_name, "TokenFactory");
        assert_eq!(artifact.bytecode_bytes().unwrap().len(), 5);
        assert_eq!(
            artifact.bytecode_hash().unwrap(),
            keccak256([0x60, 0x80, 0x60, 0x40, 0x52])
        );
    }

    #[test]
    fn artifact_without_bytecode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), "0x");
        assert!(matches!(
            ContractArtifact::load_from_file(&path),
            Err(ChainError::Artifact(_))
        ));
    }

    #[test]
    fn missing_artifact_is_an_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ContractArtifact::load_from_file(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(ChainError::Artifact(_))));
    }

    #[test]
    fn deployment_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStore::new(dir.path());
        assert!(store.load(Network::Localhost, FACTORY_CONTRACT).unwrap().is_none());

        let record = DeploymentRecord {
            address: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            transaction_hash: B256::repeat_byte(0x11),
            block_number: 1,
            bytecode_hash: B256::repeat_byte(0x22),
            deployed_at: Utc::now(),
        };
        let path = store.save(Network::Localhost, FACTORY_CONTRACT, &record).unwrap();
        assert!(path.ends_with("localhost/TokenFactory.json"));

        let loaded = store.load(Network::Localhost, FACTORY_CONTRACT).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(store.load(Network::Sepolia, FACTORY_CONTRACT).unwrap().is_none());
    }
}
