//! Relayer-backed [`EncryptionSdk`]: validates a signed decryption request,
//! posts it to the relayer, and opens the values sealed to the session key.
//!
//! The relayer is expected to return values sealed in the [`crate::keypair`]
//! format. The default endpoint is a local relayer on `127.0.0.1:3000`.

use std::collections::HashMap;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use launchpad_core::RelayerConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::eip712::TypedDataPayload;
use crate::error::SdkError;
use crate::keypair::SealedValue;
use crate::{EncryptionSdk, HandleContractPair, UserDecryptRequest, unix_now};

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestValidity {
    start_timestamp: String,
    duration_days: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserDecryptBody {
    handle_contract_pairs: Vec<HandleContractPair>,
    request_validity: RequestValidity,
    contracts_chain_id: String,
    contract_addresses: Vec<Address>,
    user_address: Address,
    signature: String,
    public_key: String,
    extra_data: String,
}

#[derive(Debug, Deserialize)]
struct UserDecryptResponse {
    response: Vec<SealedEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SealedEntry {
    handle: B256,
    ephemeral_public_key: String,
    ciphertext: String,
}

impl SealedEntry {
    fn sealed(&self) -> Result<SealedValue, SdkError> {
        let key = hex::decode(self.ephemeral_public_key.trim_start_matches("0x"))
            .map_err(|e| SdkError::Crypto(format!("ephemeral key is not hex: {e}")))?;
        let ephemeral_public_key: [u8; 32] = key.try_into().map_err(|k: Vec<u8>| {
            SdkError::Crypto(format!("ephemeral key must be 32 bytes, got {}", k.len()))
        })?;
        let ciphertext = hex::decode(self.ciphertext.trim_start_matches("0x"))
            .map_err(|e| SdkError::Crypto(format!("ciphertext is not hex: {e}")))?;
        Ok(SealedValue {
            ephemeral_public_key,
            ciphertext,
        })
    }
}

// ---------------------------------------------------------------------------
// RelayerSdk
// ---------------------------------------------------------------------------

pub struct RelayerSdk {
    config: RelayerConfig,
    client: reqwest::Client,
}

impl RelayerSdk {
    pub fn new(config: RelayerConfig, timeout: Duration) -> Result<Self, SdkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SdkError::Init(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Build the client and probe the relayer's key endpoint.
    pub async fn connect(config: RelayerConfig, timeout: Duration) -> Result<Self, SdkError> {
        let sdk = Self::new(config, timeout)?;
        let url = sdk.endpoint("v1/keyurl");
        debug!(%url, "probing relayer");

        let resp = sdk
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SdkError::Init(format!("relayer unreachable at {url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SdkError::Init(format!(
                "relayer key endpoint returned HTTP {}",
                status.as_u16()
            )));
        }
        info!(relayer = %sdk.config.relayer_url, "encryption instance ready");
        Ok(sdk)
    }

    pub fn config(&self) -> &RelayerConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.relayer_url.trim_end_matches('/'))
    }

    fn build_body(&self, request: &UserDecryptRequest) -> UserDecryptBody {
        UserDecryptBody {
            handle_contract_pairs: request.handles.clone(),
            request_validity: RequestValidity {
                start_timestamp: request.start_timestamp.to_string(),
                duration_days: request.duration_days.to_string(),
            },
            contracts_chain_id: self.config.chain_id.to_string(),
            contract_addresses: request.contract_addresses.clone(),
            user_address: request.user_address,
            signature: request.signature.trim_start_matches("0x").to_string(),
            public_key: request.keypair.public_key_hex(),
            extra_data: "0x00".to_string(),
        }
    }
}

/// Open every requested entry. Entries for handles that were not requested
/// are skipped.
fn open_entries(
    request: &UserDecryptRequest,
    entries: Vec<SealedEntry>,
) -> Result<HashMap<B256, U256>, SdkError> {
    let mut values = HashMap::with_capacity(entries.len());
    for entry in entries {
        if !request.handles.iter().any(|p| p.handle == entry.handle) {
            warn!(handle = %entry.handle, "relayer returned an unrequested handle");
            continue;
        }
        let value = request.keypair.open(&entry.sealed()?)?;
        values.insert(entry.handle, value);
    }
    Ok(values)
}

#[async_trait]
impl EncryptionSdk for RelayerSdk {
    fn create_eip712(
        &self,
        public_key: &[u8],
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> TypedDataPayload {
        TypedDataPayload::new(
            self.config.gateway_chain_id,
            self.config.verifying_contract,
            public_key,
            contract_addresses,
            start_timestamp,
            duration_days,
        )
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<HashMap<B256, U256>, SdkError> {
        request.validate(unix_now())?;

        let url = self.endpoint("v1/user-decrypt");
        let body = self.build_body(&request);
        debug!(%url, handles = body.handle_contract_pairs.len(), "requesting user decryption");

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SdkError::Relayer {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let parsed: UserDecryptResponse = serde_json::from_str(&text)?;
        open_entries(&request, parsed.response)
    }
}
