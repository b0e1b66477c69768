use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use serde_json::Value;
use tracing::info;

use crate::error::ChainError;
use crate::rpc::{EvmRpc, TransactionReceipt, TransactionRequest, wait_for_receipt};

/// A connected (or not yet connected) wallet.
///
/// Holds the RPC endpoint and the account that signs. Constructed once and
/// handed to whatever needs to read the chain or send transactions.
#[derive(Clone)]
pub struct WalletSession {
    rpc: Arc<dyn EvmRpc>,
    account: Option<Address>,
    poll_interval: Duration,
}

impl WalletSession {
    /// A session with no connected account. Reads still work.
    pub fn disconnected(rpc: Arc<dyn EvmRpc>, poll_interval: Duration) -> Self {
        Self {
            rpc,
            account: None,
            poll_interval,
        }
    }

    /// Ask the wallet for its accounts and pick `preferred` (if given) or the first one.
    pub async fn connect(
        rpc: Arc<dyn EvmRpc>,
        preferred: Option<Address>,
        poll_interval: Duration,
    ) -> Result<Self, ChainError> {
        let accounts = rpc.accounts().await?;
        let account = match preferred {
            Some(wanted) if accounts.contains(&wanted) => wanted,
            Some(wanted) => {
                return Err(ChainError::Rejected(format!(
                    "wallet does not control account {wanted}"
                )));
            }
            None => *accounts.first().ok_or(ChainError::NotConnected)?,
        };
        info!(account = %account, "wallet connected");
        Ok(Self {
            rpc,
            account: Some(account),
            poll_interval,
        })
    }

    pub fn rpc(&self) -> &dyn EvmRpc {
        self.rpc.as_ref()
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// The signing account, or [`ChainError::NotConnected`].
    pub fn signer(&self) -> Result<Address, ChainError> {
        self.account.ok_or(ChainError::NotConnected)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ChainError> {
        if self.account != Some(tx.from) {
            return Err(ChainError::NotConnected);
        }
        self.rpc.send_transaction(tx).await
    }

    pub async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt, ChainError> {
        wait_for_receipt(self.rpc.as_ref(), tx_hash, self.poll_interval).await
    }

    /// Ask the wallet to sign an EIP-712 payload with the connected account.
    pub async fn sign_typed_data(&self, typed_data: &Value) -> Result<String, ChainError> {
        let signer = self.signer()?;
        self.rpc.sign_typed_data(signer, typed_data).await
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("account", &self.account)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
