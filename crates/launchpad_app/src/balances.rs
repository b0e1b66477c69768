use alloy_primitives::{Address, B256};
use futures::future::join_all;
use launchpad_chain::{EvmRpc, TokenContract};
use tracing::warn;

use crate::catalog::CatalogToken;

/// The encrypted-balance handle the connected account holds for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceHandle {
    pub token: Address,
    pub handle: B256,
}

/// Read every balance handle of `account` concurrently.
///
/// Nothing is read without an account or tokens. Reads that fail are logged
/// and dropped, as are zero handles (no recorded balance).
pub async fn fetch_balances(
    rpc: &dyn EvmRpc,
    account: Option<Address>,
    tokens: &[CatalogToken],
) -> Vec<BalanceHandle> {
    let Some(account) = account else {
        return Vec::new();
    };
    if tokens.is_empty() {
        return Vec::new();
    }

    let reads = tokens.iter().map(|t| async move {
        let result = TokenContract::new(t.token)
            .confidential_balance_of(rpc, account)
            .await;
        (t.token, result)
    });

    join_all(reads)
        .await
        .into_iter()
        .filter_map(|(token, result)| match result {
            Ok(handle) if handle != B256::ZERO => Some(BalanceHandle { token, handle }),
            Ok(_) => None,
            Err(e) => {
                warn!(token = %token, "balance read failed: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy_primitives::{Bytes, U256};
    use async_trait::async_trait;
    use launchpad_chain::{ChainError, TransactionReceipt, TransactionRequest};

    /// Answers `confidentialBalanceOf` from a fixed table; unknown tokens fail.
    struct HandleTable {
        handles: HashMap<Address, B256>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EvmRpc for HandleTable {
        async fn chain_id(&self) -> Result<u64, ChainError> {
            Ok(31_337)
        }
        async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
            Ok(vec![])
        }
        async fn call(&self, to: Address, _data: Bytes) -> Result<Bytes, ChainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.handles
                .get(&to)
                .map(|h| Bytes::copy_from_slice(h.as_slice()))
                .ok_or_else(|| ChainError::Reverted("no such token".into()))
        }
        async fn send_transaction(&self, _tx: &TransactionRequest) -> Result<B256, ChainError> {
            unreachable!()
        }
        async fn transaction_receipt(
            &self,
            _hash: B256,
        ) -> Result<Option<TransactionReceipt>, ChainError> {
            unreachable!()
        }
        async fn sign_typed_data(
            &self,
            _signer: Address,
            _typed_data: &serde_json::Value,
        ) -> Result<String, ChainError> {
            unreachable!()
        }
    }

    fn token(byte: u8) -> CatalogToken {
        CatalogToken {
            token: Address::repeat_byte(byte),
            name: "T".into(),
            symbol: "T".into(),
            max_supply: 10,
            price_per_token: U256::from(1u64),
            creator: Address::ZERO,
            sale_supply: 10,
        }
    }

    fn table(entries: &[(u8, B256)]) -> HandleTable {
        HandleTable {
            handles: entries
                .iter()
                .map(|(b, h)| (Address::repeat_byte(*b), *h))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn keeps_only_nonzero_successful_reads() {
        let rpc = table(&[(1, B256::repeat_byte(0xaa)), (2, B256::ZERO)]);
        let tokens = [token(1), token(2), token(3)];
        let handles = fetch_balances(&rpc, Some(Address::repeat_byte(0x77)), &tokens).await;

        assert_eq!(
            handles,
            vec![BalanceHandle {
                token: Address::repeat_byte(1),
                handle: B256::repeat_byte(0xaa)
            }]
        );
        assert_eq!(rpc.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn disabled_without_account_or_tokens() {
        let rpc = table(&[(1, B256::repeat_byte(0xaa))]);
        assert!(fetch_balances(&rpc, None, &[token(1)]).await.is_empty());
        assert!(
            fetch_balances(&rpc, Some(Address::repeat_byte(0x77)), &[])
                .await
                .is_empty()
        );
        assert_eq!(rpc.calls.load(Ordering::SeqCst), 0);
    }
}
