//! Keystore signing relay.
//!
//! - `service`: the signing worker. Runs on its own OS thread, decrypts a
//!   keystore per request, signs, and forgets the key.
//! - `client`: main-context side of the worker port. Owns the pending
//!   request table and correlates responses by request id.
//! - `signers`: keypairs and the `Signer` adapter the chain library calls.
//! - `submit`: sign-and-send orchestration over a `ChainApi`.
//! - `store`, `prompt`, `chain`: the external collaborators as traits.

pub mod chain;
pub mod client;
pub mod prompt;
pub mod relay;
pub mod service;
pub mod signers;
pub mod store;
pub mod submit;


pub use chain::{ChainApi, StatusStream, SubmissionStatus, UnsignedExtrinsic};
pub use client::SignerClient;
pub use prompt::{ChannelPrompt, FixedPassword, PasswordPrompt, PendingPrompt, PromptRequest};
pub use relay::SigningRelay;
pub use service::{SigningWorker, WorkerChannels};
pub use signers::{
    Keypair, KeystoreSigner, RawType, SignatureResult, Signer, SignerError, SignerPayload,
    SignerPayloadRaw, SignerResult,
};
pub use store::{AccountStore, DirAccountStore, MemoryAccountStore};
pub use submit::Submitter;
