use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for user-triggered flows.
///
/// Crate-specific errors (`ChainError`, `SdkError`) convert into this type,
/// which decides how the failure is categorized and shown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchpadError {
    /// Input or state rejected before any network call.
    #[error("{0}")]
    Precondition(String),

    /// Wallet not connected, signer missing, or the user rejected a request.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// RPC transport failure or malformed node response.
    #[error("Network error: {0}")]
    Network(String),

    /// The contract rejected the call or transaction.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Encryption instance or relayer failure.
    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad classification used for logging and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    Precondition,
    Wallet,
    Network,
    Decryption,
    Config,
    Internal,
}

impl LaunchpadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Precondition(_) => ErrorCategory::Precondition,
            Self::Wallet(_) => ErrorCategory::Wallet,
            Self::Network(_) | Self::Reverted(_) => ErrorCategory::Network,
            Self::Decryption(_) => ErrorCategory::Decryption,
            Self::Config(_) => ErrorCategory::Config,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Status-line text for this failure. Keeps the underlying message so the
    /// user can see what the node or wallet reported.
    pub fn user_message(&self) -> String {
        match self {
            Self::Precondition(msg) => msg.clone(),
            Self::Wallet(msg) => msg.clone(),
            Self::Network(msg) => format!("Network error: {msg}"),
            Self::Reverted(msg) => format!("Transaction reverted: {msg}"),
            Self::Decryption(msg) => format!("Decryption failed: {msg}"),
            Self::Config(msg) => msg.clone(),
            Self::Internal(_) => "An unexpected error occurred.".into(),
        }
    }

    /// Whether this failure happened before anything was sent to the network.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_) | Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(
            LaunchpadError::Precondition("x".into()).category(),
            ErrorCategory::Precondition
        );
        assert_eq!(
            LaunchpadError::Reverted("x".into()).category(),
            ErrorCategory::Network
        );
        assert_eq!(
            LaunchpadError::Decryption("x".into()).category(),
            ErrorCategory::Decryption
        );
    }

    #[test]
    fn user_message_keeps_underlying_text() {
        let err = LaunchpadError::Reverted("sale supply exhausted".into());
        assert_eq!(err.user_message(), "Transaction reverted: sale supply exhausted");

        let err = LaunchpadError::Precondition("Price must be positive".into());
        assert_eq!(err.user_message(), "Price must be positive");
    }

    #[test]
    fn internal_hides_details() {
        let err = LaunchpadError::Internal("mutex poisoned at 0x1234".into());
        assert!(!err.user_message().contains("0x1234"));
    }

    #[test]
    fn precondition_detection() {
        assert!(LaunchpadError::Config("no factory".into()).is_precondition());
        assert!(!LaunchpadError::Wallet("rejected".into()).is_precondition());
    }
}
