//! Client side of confidential-balance decryption.
//!
//! The heavy lifting (homomorphic evaluation, key management, re-encryption)
//! happens on-chain and in the decryption network. This crate covers what the
//! client does around it:
//!
//! - **Keypair**: an ephemeral X25519 keypair per decryption session.
//! - **Authorization**: an EIP-712 payload the user signs to grant a
//!   time-boxed decryption of handles held by specific contracts.
//! - **Relayer**: submits the signed request and opens the values sealed to
//!   the session key.
//! - **Instance provider**: lazily builds one shared [`EncryptionSdk`].

pub mod eip712;
pub mod error;
pub mod instance;
pub mod keypair;
pub mod relayer;

use std::collections::HashMap;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use eip712::TypedDataPayload;
pub use error::SdkError;
pub use instance::{InstanceProvider, InstanceStatus};
pub use keypair::{DecryptionKeypair, SealedValue, seal_value};
pub use relayer::RelayerSdk;

/// Validity window requested for every decryption grant.
pub const DEFAULT_DURATION_DAYS: u64 = 5;
pub const MAX_DURATION_DAYS: u64 = 365;
/// Upper bound on contracts named in one authorization.
pub const MAX_CONTRACT_ADDRESSES: usize = 10;
const SECONDS_PER_DAY: u64 = 86_400;

/// One ciphertext handle and the contract that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleContractPair {
    pub handle: B256,
    pub contract_address: Address,
}

/// Everything `user_decrypt` needs, as produced by the authorization protocol.
#[derive(Debug, Clone)]
pub struct UserDecryptRequest {
    pub handles: Vec<HandleContractPair>,
    pub keypair: DecryptionKeypair,
    /// Wallet signature over the typed-data payload, hex with or without `0x`.
    pub signature: String,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl UserDecryptRequest {
    /// Reject requests the relayer would refuse anyway.
    pub fn validate(&self, now: u64) -> Result<(), SdkError> {
        if self.handles.is_empty() {
            return Err(SdkError::InvalidRequest("no handles to decrypt".into()));
        }
        if self.contract_addresses.is_empty() {
            return Err(SdkError::InvalidRequest("contract addresses must not be empty".into()));
        }
        if self.contract_addresses.len() > MAX_CONTRACT_ADDRESSES {
            return Err(SdkError::InvalidRequest(format!(
                "at most {MAX_CONTRACT_ADDRESSES} contract addresses per request, got {}",
                self.contract_addresses.len()
            )));
        }
        if self.duration_days == 0 || self.duration_days > MAX_DURATION_DAYS {
            return Err(SdkError::InvalidRequest(format!(
                "duration must be between 1 and {MAX_DURATION_DAYS} days, got {}",
                self.duration_days
            )));
        }
        if self.start_timestamp > now {
            return Err(SdkError::InvalidRequest("start timestamp is in the future".into()));
        }
        let expires = self.start_timestamp + self.duration_days * SECONDS_PER_DAY;
        if expires <= now {
            return Err(SdkError::InvalidRequest("authorization has expired".into()));
        }
        if let Some(stray) = self
            .handles
            .iter()
            .find(|pair| !self.contract_addresses.contains(&pair.contract_address))
        {
            return Err(SdkError::InvalidRequest(format!(
                "contract {} is not authorized in this request",
                stray.contract_address
            )));
        }
        let signature = hex::decode(self.signature.trim_start_matches("0x"))
            .map_err(|e| SdkError::InvalidSignature(e.to_string()))?;
        if signature.len() != 65 {
            return Err(SdkError::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                signature.len()
            )));
        }
        Ok(())
    }
}

/// The encryption SDK surface the launchpad orchestrates.
#[async_trait]
pub trait EncryptionSdk: Send + Sync {
    fn generate_keypair(&self) -> DecryptionKeypair {
        DecryptionKeypair::generate()
    }

    /// Build the authorization payload for `contract_addresses`.
    fn create_eip712(
        &self,
        public_key: &[u8],
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> TypedDataPayload;

    /// Decrypt handles the user is authorized for. Handles missing from the
    /// result had no value returned.
    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<HashMap<B256, U256>, SdkError>;
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
