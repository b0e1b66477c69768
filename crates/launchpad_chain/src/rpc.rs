//! Minimal Ethereum JSON-RPC client.
//!
//! Only the handful of methods the launchpad needs are exposed, behind the
//! [`EvmRpc`] trait so flows can run against an in-memory chain in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U64, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::error::ChainError;
use crate::rpc_config::RpcConfig;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Transaction handed to the wallet for signing and broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    /// `None` deploys a contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
}

/// The subset of a transaction receipt the launchpad reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: U64,
    /// `0x1` on success, `0x0` on revert. Pre-Byzantium nodes omit it.
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub gas_used: U256,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|s| s == U64::from(1))
    }

    pub fn block(&self) -> u64 {
        self.block_number.to::<u64>()
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Turn a raw JSON-RPC response body into a typed result.
fn parse_response<T: DeserializeOwned>(body: Value) -> Result<T, ChainError> {
    let response: RpcResponse = serde_json::from_value(body)?;
    if let Some(err) = response.error {
        return Err(ChainError::from_rpc(err.code, err.message, err.data.as_ref()));
    }
    let result = response.result.unwrap_or(Value::Null);
    serde_json::from_value(result).map_err(|e| ChainError::InvalidResponse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The node/wallet surface the launchpad depends on.
#[async_trait]
pub trait EvmRpc: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Accounts the wallet behind this endpoint can sign for.
    async fn accounts(&self) -> Result<Vec<Address>, ChainError>;

    /// Read-only contract call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Sign and broadcast; returns the transaction hash.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ChainError>;

    /// `None` while the transaction is still pending.
    async fn transaction_receipt(&self, hash: B256)
    -> Result<Option<TransactionReceipt>, ChainError>;

    /// EIP-712 signature (`eth_signTypedData_v4`) as a `0x`-prefixed hex string.
    async fn sign_typed_data(&self, signer: Address, typed_data: &Value)
    -> Result<String, ChainError>;
}

/// Poll until the transaction is mined. No overall deadline is applied.
pub async fn wait_for_receipt(
    rpc: &dyn EvmRpc,
    tx_hash: B256,
    poll_interval: Duration,
) -> Result<TransactionReceipt, ChainError> {
    let mut polls: u64 = 0;
    loop {
        if let Some(receipt) = rpc.transaction_receipt(tx_hash).await? {
            if !receipt.succeeded() {
                return Err(ChainError::Reverted(format!(
                    "transaction {tx_hash} failed in block {}",
                    receipt.block()
                )));
            }
            debug!(tx = %tx_hash, block = receipt.block(), "transaction confirmed");
            return Ok(receipt);
        }
        polls += 1;
        if polls % 30 == 0 {
            debug!(tx = %tx_hash, polls, "still waiting for receipt");
        }
        tokio::time::sleep(poll_interval).await;
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// JSON-RPC over HTTP(S) via `reqwest`.
pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &RpcConfig) -> Result<Self, ChainError> {
        Self::new(config.url.clone(), config.timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one JSON-RPC request and decode its `result`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        trace!(id, method, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChainError::Transport(format!("HTTP {status}: {text}")));
        }

        let value: Value = response.json().await.map_err(|e| self.map_transport(e))?;
        parse_response(value)
    }

    fn map_transport(&self, err: reqwest::Error) -> ChainError {
        if err.is_timeout() {
            ChainError::Timeout(self.timeout)
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl EvmRpc for JsonRpcClient {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        self.request("eth_accounts", json!([])).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ChainError> {
        self.request("eth_sendTransaction", json!([tx])).await
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ChainError> {
        self.request("eth_getTransactionReceipt", json!([hash])).await
    }

    async fn sign_typed_data(
        &self,
        signer: Address,
        typed_data: &Value,
    ) -> Result<String, ChainError> {
        // v4 takes the typed data as a JSON string, not an object.
        let payload = serde_json::to_string(typed_data)?;
        self.request("eth_signTypedData_v4", json!([signer, payload]))
            .await
    }
}
