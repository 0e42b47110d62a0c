//! Frames exchanged between the signer client and the signing worker.
//!
//! Every frame is a JSON object tagged by `type`:
//! - `sign-hex` (client -> worker): decrypt `json` with `password`, sign `hex`
//! - `signed`   (worker -> client): signature for request `id`
//! - `error`    (worker -> client): failure for request `id`

use serde::{Deserialize, Serialize};

use crate::types::{KeystoreRecord, Password};

/// Reason reported when the keystore cannot be opened with the password.
pub const DECRYPTION_FAILED: &str = "decryption failed";

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignHexRequest {
    pub id: String,
    pub ss58: u16,
    pub address: String,
    pub json: KeystoreRecord,
    pub password: Password,
    pub hex: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerRequest {
    #[serde(rename = "sign-hex")]
    SignHex(SignHexRequest),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerResponse {
    Signed { id: String, signature: String },
    Error { id: String, message: String },
}

impl WorkerRequest {
    pub fn id(&self) -> &str {
        match self {
            WorkerRequest::SignHex(req) => &req.id,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl WorkerResponse {
    pub fn id(&self) -> &str {
        match self {
            WorkerResponse::Signed { id, .. } | WorkerResponse::Error { id, .. } => id,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Best-effort extraction of the `id` of a frame that failed to decode, so
/// the sender can still be answered.
pub fn peek_id(bytes: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct IdOnly {
        id: String,
    }
    serde_json::from_slice::<IdOnly>(bytes).ok().map(|f| f.id)
}
