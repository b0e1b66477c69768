//! Token catalog as published by the factory.

use alloy_primitives::{Address, U256};
use launchpad_chain::{ChainError, EvmRpc, FactoryContract, TokenInfo};
use tracing::debug;

/// One token listed by the factory, with its remaining sale supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogToken {
    pub token: Address,
    pub name: String,
    pub symbol: String,
    pub max_supply: u64,
    /// Wei per whole token unit.
    pub price_per_token: U256,
    pub creator: Address,
    pub sale_supply: u64,
}

impl CatalogToken {
    fn from_parts(info: TokenInfo, sale_supply: u64) -> Self {
        Self {
            token: info.token,
            name: info.name,
            symbol: info.symbol,
            max_supply: info.maxSupply,
            price_per_token: info.pricePerToken,
            creator: info.creator,
            sale_supply,
        }
    }
}

/// Zip the factory's two parallel sequences. They must have equal length.
pub fn align_catalog(
    tokens: Vec<TokenInfo>,
    sale_supply: Vec<u64>,
) -> Result<Vec<CatalogToken>, ChainError> {
    if tokens.len() != sale_supply.len() {
        return Err(ChainError::CatalogMisaligned {
            tokens: tokens.len(),
            supplies: sale_supply.len(),
        });
    }
    Ok(tokens
        .into_iter()
        .zip(sale_supply)
        .map(|(info, supply)| CatalogToken::from_parts(info, supply))
        .collect())
}

/// Read the catalog. `Ok(None)` when no factory is configured.
pub async fn fetch_catalog(
    rpc: &dyn EvmRpc,
    factory: Address,
) -> Result<Option<Vec<CatalogToken>>, ChainError> {
    if factory == Address::ZERO {
        return Ok(None);
    }
    let (tokens, sale_supply) = FactoryContract::new(factory).get_catalog(rpc).await?;
    let catalog = align_catalog(tokens, sale_supply)?;
    debug!(factory = %factory, tokens = catalog.len(), "catalog fetched");
    Ok(Some(catalog))
}
