//! ABI bindings for the token factory and the confidential token.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{SolCall, sol};

use crate::error::ChainError;
use crate::rpc::{EvmRpc, TransactionRequest};

sol! {
    /// A catalog entry as stored by the factory.
    #[derive(Debug, PartialEq, Eq)]
    struct TokenInfo {
        address token;
        string name;
        string symbol;
        uint64 maxSupply;
        uint256 pricePerToken;
        address creator;
    }

    interface ITokenFactory {
        function createToken(string name, string symbol, uint64 supply, uint256 pricePerToken) external returns (address token);
        function getCatalog() external view returns (TokenInfo[] tokens, uint64[] saleSupply);
        function tokenCount() external view returns (uint256);
        function getToken(uint256 index) external view returns (TokenInfo);
    }

    interface IConfidentialToken {
        function buy(uint64 amount) external payable;
        function pricePerToken() external view returns (uint256);
        function saleSupply() external view returns (uint64);
        function confidentialBalanceOf(address account) external view returns (bytes32);
    }
}

/// Run a view call and decode its return values.
async fn view<C: SolCall + Send + Sync>(
    rpc: &dyn EvmRpc,
    to: Address,
    call: &C,
) -> Result<C::Return, ChainError> {
    let output = rpc.call(to, Bytes::from(call.abi_encode())).await?;
    Ok(C::abi_decode_returns(&output, true)?)
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Typed handle on a deployed `TokenFactory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryContract {
    address: Address,
}

impl FactoryContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the two index-aligned sequences exactly as the contract does.
    pub async fn get_catalog(
        &self,
        rpc: &dyn EvmRpc,
    ) -> Result<(Vec<TokenInfo>, Vec<u64>), ChainError> {
        let ret = view(rpc, self.address, &ITokenFactory::getCatalogCall {}).await?;
        Ok((ret.tokens, ret.saleSupply))
    }

    pub async fn token_count(&self, rpc: &dyn EvmRpc) -> Result<U256, ChainError> {
        let ret = view(rpc, self.address, &ITokenFactory::tokenCountCall {}).await?;
        Ok(ret._0)
    }

    pub async fn get_token(&self, rpc: &dyn EvmRpc, index: U256) -> Result<TokenInfo, ChainError> {
        let ret = view(rpc, self.address, &ITokenFactory::getTokenCall { index }).await?;
        Ok(ret._0)
    }

    /// A supply of zero lets the contract apply its default.
    pub fn create_token_tx(
        &self,
        from: Address,
        name: &str,
        symbol: &str,
        supply: u64,
        price_per_token: U256,
    ) -> TransactionRequest {
        let call = ITokenFactory::createTokenCall {
            name: name.to_string(),
            symbol: symbol.to_string(),
            supply,
            pricePerToken: price_per_token,
        };
        TransactionRequest {
            from,
            to: Some(self.address),
            value: None,
            data: Bytes::from(call.abi_encode()),
        }
    }
}

// ---------------------------------------------------------------------------
// Confidential token
// ---------------------------------------------------------------------------

/// Typed handle on one `ConfidentialToken` created by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenContract {
    address: Address,
}

impl TokenContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn price_per_token(&self, rpc: &dyn EvmRpc) -> Result<U256, ChainError> {
        let ret = view(rpc, self.address, &IConfidentialToken::pricePerTokenCall {}).await?;
        Ok(ret._0)
    }

    pub async fn sale_supply(&self, rpc: &dyn EvmRpc) -> Result<u64, ChainError> {
        let ret = view(rpc, self.address, &IConfidentialToken::saleSupplyCall {}).await?;
        Ok(ret._0)
    }

    /// The encrypted-balance handle of `account`. The zero hash means no balance.
    pub async fn confidential_balance_of(
        &self,
        rpc: &dyn EvmRpc,
        account: Address,
    ) -> Result<B256, ChainError> {
        let call = IConfidentialToken::confidentialBalanceOfCall { account };
        let ret = view(rpc, self.address, &call).await?;
        Ok(ret._0)
    }

    /// `value` must equal `amount × pricePerToken` or the contract reverts.
    pub fn buy_tx(&self, from: Address, amount: u64, value: U256) -> TransactionRequest {
        let call = IConfidentialToken::buyCall { amount };
        TransactionRequest {
            from,
            to: Some(self.address),
            value: Some(value),
            data: Bytes::from(call.abi_encode()),
        }
    }
}

/// Exact wei cost of buying `amount` units at `price_per_token`; `None` on overflow.
pub fn purchase_cost(price_per_token: U256, amount: u64) -> Option<U256> {
    price_per_token.checked_mul(U256::from(amount))
}
