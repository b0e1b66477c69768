//! Chain-layer error types.

use std::time::Duration;

use launchpad_core::LaunchpadError;

/// JSON-RPC error code wallets use for a user-rejected request (EIP-1193).
pub const USER_REJECTED_CODE: i64 = 4001;

/// Errors that can occur while talking to the node or the contracts.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// HTTP-level failure reaching the RPC endpoint.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A call or transaction was reverted by the contract.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// The wallet refused to sign or send.
    #[error("User rejected the request: {0}")]
    Rejected(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("ABI error: {0}")]
    Abi(String),

    /// `getCatalog` returned sequences of different lengths.
    #[error("Catalog is misaligned: {tokens} tokens but {supplies} sale supplies")]
    CatalogMisaligned { tokens: usize, supplies: usize },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        ChainError::Transport(err.to_string())
    }
}

impl From<alloy_sol_types::Error> for ChainError {
    fn from(err: alloy_sol_types::Error) -> Self {
        ChainError::Abi(err.to_string())
    }
}

impl ChainError {
    /// Classify a JSON-RPC error object into the most specific variant.
    pub fn from_rpc(code: i64, message: String, data: Option<&serde_json::Value>) -> Self {
        let lower = message.to_lowercase();
        if code == USER_REJECTED_CODE || lower.contains("user rejected") || lower.contains("user denied") {
            return ChainError::Rejected(message);
        }
        if lower.contains("revert") {
            let reason = data
                .and_then(|d| d.as_str())
                .and_then(|s| hex::decode(s.trim_start_matches("0x")).ok())
                .and_then(|bytes| alloy_sol_types::decode_revert_reason(&bytes));
            return ChainError::Reverted(reason.unwrap_or(message));
        }
        ChainError::Rpc { code, message }
    }
}

impl From<ChainError> for LaunchpadError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::NotConnected => LaunchpadError::Wallet("Wallet not connected".into()),
            ChainError::Rejected(msg) => LaunchpadError::Wallet(format!("User rejected the request: {msg}")),
            ChainError::Reverted(msg) => LaunchpadError::Reverted(msg),
            ChainError::Transport(msg) => LaunchpadError::Network(msg),
            ChainError::Timeout(d) => LaunchpadError::Network(format!("timed out after {d:?}")),
            ChainError::Rpc { code, message } => {
                LaunchpadError::Network(format!("RPC error {code}: {message}"))
            }
            ChainError::Artifact(msg) => LaunchpadError::Config(msg),
            other => LaunchpadError::Internal(other.to_string()),
        }
    }
}
