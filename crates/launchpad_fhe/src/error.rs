use launchpad_core::LaunchpadError;

/// Errors from the encryption instance and the decryption relayer.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("Encryption instance is not ready yet")]
    NotReady,

    #[error("Encryption instance failed to initialize: {0}")]
    Init(String),

    /// Rejected client-side before contacting the relayer.
    #[error("Invalid decryption request: {0}")]
    InvalidRequest(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("Relayer returned HTTP {status}: {body}")]
    Relayer { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    /// A sealed value could not be opened with the session key.
    #[error("Cannot open decrypted value: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for SdkError {
    fn from(err: reqwest::Error) -> Self {
        SdkError::Transport(err.to_string())
    }
}

impl From<SdkError> for LaunchpadError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::Transport(msg) => LaunchpadError::Network(msg),
            other => LaunchpadError::Decryption(other.to_string()),
        }
    }
}
