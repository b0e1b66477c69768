//! Ephemeral session keypairs and the sealed-value format the relayer uses to
//! return plaintexts.
//!
//! A value is sealed to the session public key with X25519 key agreement, a
//! SHA-256 key derivation, and AES-256-GCM. The ciphertext layout is
//! `nonce || ciphertext+tag`.
//!
//! This sealing format is specific to this workspace. A relayer must be built
//! to speak it; the hosted fhEVM testnet relayer does not.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use alloy_primitives::U256;
use curve25519_dalek::montgomery::MontgomeryPoint;
use sha2::{Digest, Sha256};

use crate::error::SdkError;

const AES_NONCE_LEN: usize = 12;
const KDF_CONTEXT: &[u8] = b"launchpad-user-decrypt-v1";

/// Keypair generated for a single decryption session.
#[derive(Clone, PartialEq, Eq)]
pub struct DecryptionKeypair {
    public_key: [u8; 32],
    private_key: [u8; 32],
}

impl DecryptionKeypair {
    pub fn generate() -> Self {
        let private_key: [u8; 32] = rand::random();
        Self::from_private_key(private_key)
    }

    pub fn from_private_key(private_key: [u8; 32]) -> Self {
        let public_key = MontgomeryPoint::mul_base_clamped(private_key).to_bytes();
        Self {
            public_key,
            private_key,
        }
    }

    /// Rebuild a keypair from both halves, checking they belong together.
    pub fn from_parts(public_key: [u8; 32], private_key: [u8; 32]) -> Result<Self, SdkError> {
        let keypair = Self::from_private_key(private_key);
        if keypair.public_key != public_key {
            return Err(SdkError::InvalidKeypair(
                "public key does not match private key".into(),
            ));
        }
        Ok(keypair)
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.public_key
    }

    pub fn private_key(&self) -> [u8; 32] {
        self.private_key
    }

    /// Hex without `0x`, as the relayer expects.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    /// Open a value the relayer sealed to this keypair's public key.
    pub fn open(&self, sealed: &SealedValue) -> Result<U256, SdkError> {
        if sealed.ciphertext.len() < AES_NONCE_LEN {
            return Err(SdkError::Crypto(format!(
                "ciphertext too short (expected at least {AES_NONCE_LEN} bytes for nonce)"
            )));
        }
        let shared = shared_secret(&self.private_key, &sealed.ephemeral_public_key)?;
        let key_bytes = derive_key(&shared, &sealed.ephemeral_public_key, &self.public_key);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

        let (nonce_bytes, encrypted) = sealed.ciphertext.split_at(AES_NONCE_LEN);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
            .map_err(|e| SdkError::Crypto(format!("decryption failed: {e}")))?;

        if plaintext.len() != 32 {
            return Err(SdkError::Crypto(format!(
                "expected a 32-byte plaintext, got {} bytes",
                plaintext.len()
            )));
        }
        Ok(U256::from_be_slice(&plaintext))
    }
}

impl std::fmt::Debug for DecryptionKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionKeypair")
            .field("public_key", &self.public_key_hex())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// A plaintext sealed to a session public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedValue {
    pub ephemeral_public_key: [u8; 32],
    pub ciphertext: Vec<u8>,
}

/// Seal `value` for `recipient_public_key`. This is the relayer side of
/// [`DecryptionKeypair::open`].
pub fn seal_value(recipient_public_key: &[u8; 32], value: U256) -> Result<SealedValue, SdkError> {
    let ephemeral = DecryptionKeypair::generate();
    let shared = shared_secret(&ephemeral.private_key, recipient_public_key)?;
    let key_bytes = derive_key(&shared, &ephemeral.public_key, recipient_public_key);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    let nonce_bytes: [u8; AES_NONCE_LEN] = rand::random();
    let encrypted = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), value.to_be_bytes::<32>().as_slice())
        .map_err(|e| SdkError::Crypto(format!("encryption failed: {e}")))?;

    let mut ciphertext = nonce_bytes.to_vec();
    ciphertext.extend_from_slice(&encrypted);
    Ok(SealedValue {
        ephemeral_public_key: ephemeral.public_key,
        ciphertext,
    })
}

fn shared_secret(private_key: &[u8; 32], peer_public: &[u8; 32]) -> Result<[u8; 32], SdkError> {
    let shared = MontgomeryPoint(*peer_public).mul_clamped(*private_key).to_bytes();
    // Low-order peer points collapse to zero.
    if shared == [0u8; 32] {
        return Err(SdkError::Crypto("degenerate key agreement".into()));
    }
    Ok(shared)
}

fn derive_key(shared: &[u8; 32], ephemeral_public: &[u8; 32], recipient_public: &[u8; 32]) -> [u8; 32] {
    Sha256::new()
        .chain_update(KDF_CONTEXT)
        .chain_update(shared)
        .chain_update(ephemeral_public)
        .chain_update(recipient_public)
        .finalize()
        .into()
}
