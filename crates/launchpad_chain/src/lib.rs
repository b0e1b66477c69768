//! EVM plumbing for the confidential token launchpad: endpoint configuration,
//! a JSON-RPC client, the wallet session, contract bindings, and deployment
//! records.

pub mod artifact;
pub mod contracts;
pub mod error;
pub mod rpc;
pub mod rpc_config;
pub mod wallet;

pub use artifact::{ContractArtifact, DeploymentRecord, DeploymentStore, FACTORY_CONTRACT};
pub use contracts::{FactoryContract, TokenContract, TokenInfo, purchase_cost};
pub use error::ChainError;
pub use rpc::{EvmRpc, JsonRpcClient, TransactionReceipt, TransactionRequest, wait_for_receipt};
pub use rpc_config::{RpcConfig, RpcConfigStore};
pub use wallet::WalletSession;
