//! Factory deployment from a compiled artifact.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use launchpad_chain::{
    ContractArtifact, DeploymentRecord, DeploymentStore, FACTORY_CONTRACT, TransactionRequest,
    WalletSession,
};
use launchpad_core::Network;
use tracing::info;

/// Deploy the factory unless a record with the same bytecode already exists
/// for `network`. `force` always redeploys.
pub async fn deploy_factory(
    wallet: &WalletSession,
    store: &DeploymentStore,
    network: Network,
    artifact_path: &Path,
    force: bool,
    out: &mut dyn Write,
) -> Result<DeploymentRecord> {
    let artifact = ContractArtifact::load_from_file(artifact_path)
        .with_context(|| format!("loading artifact {}", artifact_path.display()))?;
    let bytecode_hash = artifact.bytecode_hash()?;

    if !force {
        if let Some(existing) = store.load(network, FACTORY_CONTRACT)? {
            if existing.bytecode_hash == bytecode_hash {
                writeln!(
                    out,
                    "reusing \"{FACTORY_CONTRACT}\" at {}",
                    existing.address
                )?;
                writeln!(out, "{FACTORY_CONTRACT} contract: {}", existing.address)?;
                return Ok(existing);
            }
        }
    }

    let deployer = wallet.signer()?;
    let tx = TransactionRequest {
        from: deployer,
        to: None,
        value: None,
        data: artifact.bytecode_bytes()?,
    };
    let hash = wallet.send_transaction(&tx).await?;
    writeln!(out, "deploying \"{FACTORY_CONTRACT}\" (tx: {hash})")?;

    let receipt = wallet.wait_for_receipt(hash).await?;
    let address = receipt
        .contract_address
        .context("deployment receipt has no contract address")?;
    info!(address = %address, block = receipt.block(), network = %network, "factory deployed");

    let record = DeploymentRecord {
        address,
        transaction_hash: hash,
        block_number: receipt.block(),
        bytecode_hash,
        deployed_at: Utc::now(),
    };
    store.save(network, FACTORY_CONTRACT, &record)?;
    writeln!(out, "{FACTORY_CONTRACT} contract: {address}")?;
    Ok(record)
}
