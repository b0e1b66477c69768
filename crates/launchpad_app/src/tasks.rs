//! Command-line tasks that talk to the factory and tokens directly.

use std::io::Write;

use alloy_primitives::{Address, B256, U256};
use anyhow::{Context, Result, bail};
use launchpad_chain::{FactoryContract, TokenContract, WalletSession, purchase_cost};

use crate::balances::{BalanceHandle, fetch_balances};
use crate::catalog::{CatalogToken, fetch_catalog};

fn require_factory(factory: Address) -> Result<FactoryContract> {
    if factory == Address::ZERO {
        bail!(
            "No TokenFactory address configured. Run `launchpad deploy` or pass --factory <address>."
        );
    }
    Ok(FactoryContract::new(factory))
}

/// Create a token. A missing supply is sent as zero so the contract applies
/// its default. Returns the address of the new token.
pub async fn create_token(
    wallet: &WalletSession,
    factory: Address,
    name: &str,
    symbol: &str,
    supply: Option<u64>,
    price_wei: U256,
    out: &mut dyn Write,
) -> Result<Address> {
    let factory = require_factory(factory)?;
    let signer = wallet.signer()?;

    let tx = factory.create_token_tx(signer, name, symbol, supply.unwrap_or(0), price_wei);
    let hash = wallet.send_transaction(&tx).await?;
    writeln!(out, "Submitting token creation tx: {hash}")?;

    let receipt = wallet.wait_for_receipt(hash).await?;
    writeln!(out, "Token creation confirmed in block {}", receipt.block())?;

    let total = factory.token_count(wallet.rpc()).await?;
    let last = total
        .checked_sub(U256::from(1u64))
        .context("factory reports no tokens after a confirmed createToken")?;
    let created = factory.get_token(wallet.rpc(), last).await?;
    writeln!(
        out,
        "New token deployed at {} with price {} wei",
        created.token, created.pricePerToken
    )?;
    Ok(created.token)
}

/// Print every token in the catalog.
pub async fn list_catalog(
    wallet: &WalletSession,
    factory: Address,
    out: &mut dyn Write,
) -> Result<Vec<CatalogToken>> {
    let factory = require_factory(factory)?;
    let catalog = fetch_catalog(wallet.rpc(), factory.address())
        .await?
        .unwrap_or_default();

    if catalog.is_empty() {
        writeln!(out, "No tokens created yet")?;
        return Ok(catalog);
    }
    for (idx, t) in catalog.iter().enumerate() {
        writeln!(
            out,
            "#{idx} {} ({}) @ {} price={} wei maxSupply={} remaining={} creator={}",
            t.name, t.symbol, t.token, t.price_per_token, t.max_supply, t.sale_supply, t.creator
        )?;
    }
    Ok(catalog)
}

/// Buy `amount` units of `token` at its on-chain price.
pub async fn buy_token(
    wallet: &WalletSession,
    token: Address,
    amount: u64,
    out: &mut dyn Write,
) -> Result<B256> {
    if amount == 0 {
        bail!("Amount must be greater than zero");
    }
    let signer = wallet.signer()?;
    let contract = TokenContract::new(token);

    let price = contract.price_per_token(wallet.rpc()).await?;
    let value = purchase_cost(price, amount)
        .with_context(|| format!("cost of {amount} tokens at {price} wei overflows"))?;

    let hash = wallet
        .send_transaction(&contract.buy_tx(signer, amount, value))
        .await?;
    writeln!(out, "Buying {amount} tokens for {value} wei. tx={hash}")?;

    let receipt = wallet.wait_for_receipt(hash).await?;
    writeln!(out, "Purchase confirmed in block {}", receipt.block())?;
    Ok(hash)
}

/// Print the connected account's encrypted balance handles.
pub async fn list_balances(
    wallet: &WalletSession,
    factory: Address,
    out: &mut dyn Write,
) -> Result<Vec<BalanceHandle>> {
    let factory = require_factory(factory)?;
    let account = wallet.signer()?;
    let catalog = fetch_catalog(wallet.rpc(), factory.address())
        .await?
        .unwrap_or_default();
    let handles = fetch_balances(wallet.rpc(), Some(account), &catalog).await;

    if handles.is_empty() {
        writeln!(out, "No encrypted balances for {account}")?;
        return Ok(handles);
    }
    for h in &handles {
        let symbol = catalog
            .iter()
            .find(|t| t.token == h.token)
            .map(|t| t.symbol.as_str())
            .unwrap_or("?");
        writeln!(out, "{symbol} @ {} handle={}", h.token, h.handle)?;
    }
    Ok(handles)
}
