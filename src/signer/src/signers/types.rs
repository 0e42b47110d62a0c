use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::utils::{blake2_256, decode_hex};

use super::SignerResult;

/// Encoded payloads longer than this are signed through their blake2-256 hash.
pub const MAX_UNHASHED_PAYLOAD: usize = 256;

/// Structured transaction payload, as handed over by the chain library.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerPayload {
    pub address: String,
    pub block_hash: String,
    pub block_number: u64,
    pub era: String,
    pub genesis_hash: String,
    pub method: String,
    #[serde(default)]
    pub nonce: Option<u64>,
    pub spec_version: u32,
    #[serde(default)]
    pub tip: u64,
    pub transaction_version: u32,
    pub version: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawType {
    Bytes,
    Payload,
}

/// Raw signing request: sign `data` (hex) as-is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerPayloadRaw {
    pub address: String,
    pub data: String,
    #[serde(rename = "type")]
    pub kind: RawType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureResult {
    pub id: u64,
    pub signature: String,
}

/// What a chain library needs from whoever holds the keys.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign_payload(&self, payload: &SignerPayload) -> SignerResult<SignatureResult>;
    async fn sign_raw(&self, raw: &SignerPayloadRaw) -> SignerResult<SignatureResult>;
}

impl SignerPayload {
    /// Bytes the account actually signs:
    /// `method ++ era ++ compact(nonce) ++ compact(tip) ++ specVersion ++
    /// transactionVersion ++ genesisHash ++ blockHash`, hashed when long.
    pub fn signing_bytes(&self) -> SignerResult<Vec<u8>> {
        let mut out = decode_hex(&self.method)?;
        out.extend_from_slice(&decode_hex(&self.era)?);
        encode_compact(self.nonce.unwrap_or(0), &mut out);
        encode_compact(self.tip, &mut out);
        out.extend_from_slice(&self.spec_version.to_le_bytes());
        out.extend_from_slice(&self.transaction_version.to_le_bytes());
        out.extend_from_slice(&decode_hex(&self.genesis_hash)?);
        out.extend_from_slice(&decode_hex(&self.block_hash)?);

        if out.len() > MAX_UNHASHED_PAYLOAD {
            return Ok(blake2_256(&out).to_vec());
        }
        Ok(out)
    }
}

/// SCALE compact integer encoding.
pub fn encode_compact(value: u64, out: &mut Vec<u8>) {
    match value {
        0..=0x3f => out.push((value as u8) << 2),
        0x40..=0x3fff => out.extend_from_slice(&(((value as u16) << 2) | 0b01).to_le_bytes()),
        0x4000..=0x3fff_ffff => {
            out.extend_from_slice(&(((value as u32) << 2) | 0b10).to_le_bytes())
        }
        _ => {
            let bytes = value.to_le_bytes();
            let len = 8 - (value.leading_zeros() / 8) as usize;
            out.push((((len - 4) as u8) << 2) | 0b11);
            out.extend_from_slice(&bytes[..len]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(v: u64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_compact(v, &mut out);
        out
    }

    #[test]
    fn compact_encoding_boundaries() {
        assert_eq!(compact(0), vec![0x00]);
        assert_eq!(compact(1), vec![0x04]);
        assert_eq!(compact(63), vec![0xfc]);
        assert_eq!(compact(64), vec![0x01, 0x01]);
        assert_eq!(compact(16383), vec![0xfd, 0xff]);
        assert_eq!(compact(16384), vec![0x02, 0x00, 0x01, 0x00]);
        assert_eq!(compact(1 << 30), vec![0x03, 0x00, 0x00, 0x00, 0x40]);
        assert_eq!(
            compact(u64::MAX),
            vec![0x13, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    fn payload(method: &str) -> SignerPayload {
        SignerPayload {
            address: "5Addr".into(),
            block_hash: format!("0x{}", "bb".repeat(32)),
            block_number: 10,
            era: "0x00".into(),
            genesis_hash: format!("0x{}", "aa".repeat(32)),
            method: method.into(),
            nonce: Some(5),
            spec_version: 100,
            tip: 0,
            transaction_version: 1,
            version: 4,
        }
    }

    #[test]
    fn short_payload_is_signed_verbatim() {
        let bytes = payload("0x0500").signing_bytes().unwrap();
        let mut expected = vec![0x05, 0x00, 0x00, 0x14, 0x00];
        expected.extend_from_slice(&100u32.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&[0xaa; 32]);
        expected.extend_from_slice(&[0xbb; 32]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn long_payload_is_signed_through_its_hash() {
        let method = format!("0x{}", "01".repeat(300));
        let bytes = payload(&method).signing_bytes().unwrap();
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn bad_hex_is_rejected() {
        assert!(payload("0xnothex").signing_bytes().is_err());
    }

    #[test]
    fn payload_json_uses_camel_case() {
        let json = serde_json::to_value(payload("0x00")).unwrap();
        assert_eq!(json["genesisHash"], format!("0x{}", "aa".repeat(32)));
        assert_eq!(json["specVersion"], 100);

        let raw: SignerPayloadRaw =
            serde_json::from_str(r#"{"address":"5A","data":"0x01","type":"bytes"}"#).unwrap();
        assert_eq!(raw.kind, RawType::Bytes);
    }
}
