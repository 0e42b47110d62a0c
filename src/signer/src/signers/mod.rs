/*!
Signers module

- `keypair`  : ed25519 / ecdsa keypairs rebuilt from a decrypted keystore
               seed. Lives only inside the signing worker.
- `keystore` : `KeystoreSigner`, the adapter handed to the chain library. It
               never sees key material: it prompts for the password, fetches
               the encrypted record and asks the worker for a signature.
- `types`    : signing payloads, results and the `Signer` trait.
*/
pub mod keypair;
pub mod keystore;
pub mod types;

pub use keypair::Keypair;
pub use keystore::KeystoreSigner;
pub use types::{RawType, SignatureResult, Signer, SignerPayload, SignerPayloadRaw};

use shared::{AddressError, ConfigError, KeystoreError, ProtocolError};

/// Error types specific to the signer module
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("password prompt cancelled")]
    Cancelled,

    #[error("no keystore record for address {0}")]
    AccountNotFound(String),

    #[error("wrong password or corrupted credential")]
    WrongPassword,

    #[error("signing worker failed: {0}")]
    Worker(String),

    #[error("signing request {id} timed out after {after_ms} ms")]
    Timeout { id: String, after_ms: u64 },

    #[error("signing worker channel closed")]
    ChannelClosed,

    #[error("chain api is not ready")]
    ChainNotReady,

    #[error("no authenticated address to sign with")]
    NotAuthenticated,

    #[error("extrinsic submission failed: {0}")]
    Submission(String),

    #[error("status stream ended before the extrinsic was included")]
    StreamEnded,

    #[error("Invalid private key format: {0}")]
    InvalidPrivateKey(String),

    #[error("Cryptographic operation failed: {0}")]
    CryptoError(String),

    #[error("Hex decode error: {0}")]
    HexDecodeError(#[from] hex::FromHexError),

    #[error("Keystore error: {0}")]
    Keystore(#[from] KeystoreError),

    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for signer operations
pub type SignerResult<T> = Result<T, SignerError>;
