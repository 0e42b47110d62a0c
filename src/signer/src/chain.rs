use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use shared::utils::encode_hex;

use crate::signers::{Signer, SignerResult};

/// Status notifications of one submitted extrinsic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "value")]
pub enum SubmissionStatus {
    Future,
    Ready,
    Broadcast(Vec<String>),
    InBlock(String),
    Finalized(String),
    Retracted(String),
    Usurped(String),
    Dropped,
    Invalid,
    Error(String),
}

impl SubmissionStatus {
    /// Block hash for the two success states.
    pub fn block_reference(&self) -> Option<&str> {
        match self {
            SubmissionStatus::InBlock(hash) | SubmissionStatus::Finalized(hash) => Some(hash),
            _ => None,
        }
    }

    /// Description of the failure states.
    pub fn failure(&self) -> Option<String> {
        match self {
            SubmissionStatus::Error(message) => Some(message.clone()),
            SubmissionStatus::Usurped(hash) => Some(format!("usurped by {hash}")),
            SubmissionStatus::Dropped => Some("dropped from the pool".to_string()),
            SubmissionStatus::Invalid => Some("invalid transaction".to_string()),
            _ => None,
        }
    }
}

/// Call to be signed and submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedExtrinsic {
    pub section: String,
    pub method: String,
    pub call_data: Vec<u8>,
}

impl UnsignedExtrinsic {
    pub fn new(section: impl Into<String>, method: impl Into<String>, call_data: Vec<u8>) -> Self {
        Self {
            section: section.into(),
            method: method.into(),
            call_data,
        }
    }

    pub fn call_hex(&self) -> String {
        encode_hex(&self.call_data)
    }
}

pub type StatusStream = BoxStream<'static, SubmissionStatus>;

/// The chain library. The signer is passed to every submission rather than
/// installed on the handle.
#[async_trait]
pub trait ChainApi: Send + Sync {
    fn is_ready(&self) -> bool;

    /// Build the signing payload for `extrinsic`, have `signer` sign it as
    /// `address` and submit. Status notifications follow on the stream.
    async fn sign_and_send(
        &self,
        extrinsic: UnsignedExtrinsic,
        address: &str,
        signer: Arc<dyn Signer>,
    ) -> SignerResult<StatusStream>;

    fn tx(&self, section: &str, method: &str, call_data: Vec<u8>) -> UnsignedExtrinsic {
        UnsignedExtrinsic::new(section, method, call_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert_eq!(SubmissionStatus::InBlock("0xABC".into()).block_reference(), Some("0xABC"));
        assert_eq!(SubmissionStatus::Finalized("0xF".into()).block_reference(), Some("0xF"));
        assert_eq!(SubmissionStatus::Ready.block_reference(), None);
        assert!(SubmissionStatus::Broadcast(vec![]).failure().is_none());
        assert!(SubmissionStatus::Invalid.failure().is_some());
        assert_eq!(SubmissionStatus::Error("boom".into()).failure().as_deref(), Some("boom"));
    }

    #[test]
    fn status_json_shape() {
        let json = serde_json::to_value(SubmissionStatus::InBlock("0x01".into())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "inBlock", "value": "0x01"}));
    }

    #[test]
    fn call_hex_is_prefixed() {
        assert_eq!(UnsignedExtrinsic::new("balances", "transfer", vec![1, 2]).call_hex(), "0x0102");
    }
}
