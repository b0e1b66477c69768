use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use launchpad_app::{Launchpad, deploy, tasks};
use launchpad_chain::{
    DeploymentStore, EvmRpc, FACTORY_CONTRACT, JsonRpcClient, RpcConfigStore, WalletSession,
};
use launchpad_core::{LaunchpadConfig, Network, logging};
use launchpad_fhe::InstanceProvider;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "launchpad", version, about = "Launch and trade confidential tokens")]
struct Cli {
    /// Config file (defaults to ~/.launchpad/config.json)
    #[arg(long, global = true, env = "LAUNCHPAD_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    network: Option<Network>,

    /// Custom RPC endpoint for the selected network
    #[arg(long, global = true, env = "LAUNCHPAD_RPC_URL")]
    rpc_url: Option<String>,

    /// TokenFactory address
    #[arg(long, global = true)]
    factory: Option<Address>,

    /// Account to sign with (must be managed by the RPC endpoint)
    #[arg(long, global = true)]
    account: Option<Address>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy the TokenFactory and record the deployment
    Deploy {
        /// Compiled artifact (defaults to the configured artifact path)
        #[arg(long)]
        artifact: Option<PathBuf>,
        /// Redeploy even if the recorded bytecode is unchanged
        #[arg(long)]
        force: bool,
    },
    /// Create a new confidential token through the factory
    CreateToken {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        /// Total supply; omitted lets the factory apply its default
        #[arg(long)]
        supply: Option<u64>,
        /// Price per token in wei
        #[arg(long, value_parser = parse_wei)]
        price: U256,
    },
    /// List all tokens created through the factory
    Catalog,
    /// Buy a token with native currency
    BuyToken {
        #[arg(long)]
        token: Address,
        #[arg(long)]
        amount: u64,
    },
    /// Show encrypted balance handles of the connected account
    Balances,
    /// Decrypt the connected account's balance of a token
    Decrypt {
        #[arg(long)]
        token: Address,
    },
}

fn parse_wei(s: &str) -> Result<U256, String> {
    U256::from_str_radix(s.trim(), 10).map_err(|e| format!("invalid wei amount {s}: {e}"))
}

impl Cli {
    fn apply_overrides(&self, config: &mut LaunchpadConfig) {
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(url) = &self.rpc_url {
            config.rpc_url = Some(url.clone());
        }
        if let Some(factory) = self.factory {
            config.factory_address = factory;
        }
        if let Some(account) = self.account {
            config.account = Some(account);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => LaunchpadConfig::config_path()?,
    };
    let (mut config, load_error) = match LaunchpadConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (LaunchpadConfig::default(), Some(e)),
    };
    cli.apply_overrides(&mut config);

    let _log_guard =
        logging::init_logging(&config.log_level).context("Failed to initialize logging")?;
    if let Some(e) = load_error {
        warn!("{e:#}, using defaults");
    }
    info!("Starting launchpad v{VERSION} on {}", config.network);
    config.validate()?;

    if let Err(e) = run(cli.command, config).await {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

fn rpc_client(config: &LaunchpadConfig) -> Result<Arc<dyn EvmRpc>> {
    let mut store = RpcConfigStore::with_defaults();
    if let Some(url) = config.rpc_url.as_ref().filter(|u| !u.trim().is_empty()) {
        store.set_custom_rpc(config.network, url.clone())?;
    }
    store.set_timeout(config.network, config.request_timeout_secs);
    let rpc = store
        .get_rpc(config.network)
        .with_context(|| format!("no RPC endpoint for {}", config.network))?;
    info!(url = %rpc.url, custom = rpc.is_custom, "using RPC endpoint");
    Ok(Arc::new(JsonRpcClient::from_config(rpc)?))
}

/// Configured factory first, then the recorded deployment, else zero.
fn resolve_factory(config: &LaunchpadConfig, store: &DeploymentStore) -> Address {
    if config.factory_configured() {
        return config.factory_address;
    }
    match store.load(config.network, FACTORY_CONTRACT) {
        Ok(Some(record)) => record.address,
        Ok(None) => Address::ZERO,
        Err(e) => {
            warn!("cannot read deployment record: {e}");
            Address::ZERO
        }
    }
}

async fn run(command: Command, config: LaunchpadConfig) -> Result<()> {
    let rpc = rpc_client(&config)?;
    let poll = Duration::from_secs(config.receipt_poll_interval_secs);
    let store = DeploymentStore::new(&config.deployments_dir);
    let factory = resolve_factory(&config, &store);
    let mut out = std::io::stdout();

    match command {
        Command::Catalog => {
            let wallet = WalletSession::disconnected(rpc, poll);
            tasks::list_catalog(&wallet, factory, &mut out).await?;
        }
        Command::Deploy { artifact, force } => {
            let wallet = WalletSession::connect(rpc, config.account, poll).await?;
            let artifact = artifact.unwrap_or_else(|| config.artifact_path.clone());
            deploy::deploy_factory(&wallet, &store, config.network, &artifact, force, &mut out)
                .await?;
        }
        Command::CreateToken {
            name,
            symbol,
            supply,
            price,
        } => {
            let wallet = WalletSession::connect(rpc, config.account, poll).await?;
            tasks::create_token(&wallet, factory, &name, &symbol, supply, price, &mut out).await?;
        }
        Command::BuyToken { token, amount } => {
            let wallet = WalletSession::connect(rpc, config.account, poll).await?;
            tasks::buy_token(&wallet, token, amount, &mut out).await?;
        }
        Command::Balances => {
            let wallet = WalletSession::connect(rpc, config.account, poll).await?;
            tasks::list_balances(&wallet, factory, &mut out).await?;
        }
        Command::Decrypt { token } => {
            let wallet = WalletSession::connect(rpc, config.account, poll).await?;
            let instances = Arc::new(InstanceProvider::relayer(
                config.relayer.clone(),
                Duration::from_secs(config.request_timeout_secs),
            ));
            let launchpad = Launchpad::new(factory, wallet, instances);

            launchpad.refresh().await?;
            launchpad.prepare_encryption().await;
            let result = launchpad.decrypt_balance(token).await;
            if let Some(status) = launchpad.status() {
                println!("{status}");
            }
            result?;
        }
    }
    Ok(())
}
