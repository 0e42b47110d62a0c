//! Encrypted keystore record
//!
//! The JSON shape mirrors the account files a browser keyring exports:
//! an address, a base64 `encoded` secret and an `encoding` block describing
//! how to open it. The secret is `seed[32] ++ public key`, sealed with
//! `utils::crypto::seal`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{AddressError, Password};
use crate::utils::crypto;

pub const KEYSTORE_VERSION: &str = "3";
pub const CONTENT_SEED: &str = "seed";
pub const KDF_ARGON2ID: &str = "argon2id";
pub const CIPHER_XCHACHA20_POLY1305: &str = "xchacha20-poly1305";

pub const SEED_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum KeystoreError {
    #[error("decryption failed")]
    Decrypt,

    #[error("unsupported keystore encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("malformed keystore: {0}")]
    Malformed(String),

    #[error("key derivation failed: {0}")]
    Kdf(String),

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid keystore json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid address: {0}")]
    Address(#[from] AddressError),
}

/// Signature scheme of the key held in a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Ed25519,
    Ecdsa,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Ed25519 => "ed25519",
            KeyType::Ecdsa => "ecdsa",
        }
    }

    /// Length of the public key stored next to the seed.
    pub fn public_key_len(&self) -> usize {
        match self {
            KeyType::Ed25519 => 32,
            KeyType::Ecdsa => 33,
        }
    }

    /// Leading byte of a multi-signature carrying this scheme.
    pub fn signature_type_byte(&self) -> u8 {
        match self {
            KeyType::Ed25519 => 0x00,
            KeyType::Ecdsa => 0x02,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "ed25519" => Some(KeyType::Ed25519),
            "ecdsa" => Some(KeyType::Ecdsa),
            _ => None,
        }
    }
}

/// Argon2id cost parameters, stored in the record so it can be opened later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 19456,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl KdfParams {
    /// Highest costs accepted from a record or a config: 256 MiB, 16 passes,
    /// 16 lanes.
    pub const MAX: KdfParams = KdfParams {
        m_cost: 256 * 1024,
        t_cost: 16,
        p_cost: 16,
    };

    /// Cheapest parameters Argon2 accepts. Only for tests.
    pub fn insecure_for_tests() -> Self {
        Self {
            m_cost: 8,
            t_cost: 1,
            p_cost: 1,
        }
    }

    pub fn validate(&self) -> Result<(), KeystoreError> {
        let max = Self::MAX;
        if self.m_cost > max.m_cost || self.t_cost > max.t_cost || self.p_cost > max.p_cost {
            return Err(KeystoreError::Kdf(format!(
                "costs m={} t={} p={} exceed limits m={} t={} p={}",
                self.m_cost, self.t_cost, self.p_cost, max.m_cost, max.t_cost, max.p_cost
            )));
        }
        argon2::Params::new(self.m_cost, self.t_cost, self.p_cost, Some(32))
            .map(|_| ())
            .map_err(|e| KeystoreError::Kdf(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreEncoding {
    pub content: Vec<String>,
    #[serde(rename = "type")]
    pub kind: Vec<String>,
    pub version: String,
    pub kdf: KdfParams,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystoreMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub when_created: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreRecord {
    pub address: String,
    pub encoded: String,
    pub encoding: KeystoreEncoding,
    #[serde(default)]
    pub meta: KeystoreMeta,
}

/// Decrypted contents of a record. The seed is wiped on drop.
pub struct KeystoreSecret {
    pub key_type: KeyType,
    pub seed: Zeroizing<[u8; SEED_LEN]>,
    pub public_key: Vec<u8>,
}

impl KeystoreRecord {
    /// Seal `seed ++ public_key` under `password` into a new record.
    pub fn seal(
        key_type: KeyType,
        seed: &[u8; SEED_LEN],
        public_key: &[u8],
        address: String,
        password: &Password,
        kdf: KdfParams,
        meta: KeystoreMeta,
    ) -> Result<Self, KeystoreError> {
        if public_key.len() != key_type.public_key_len() {
            return Err(KeystoreError::Malformed(format!(
                "{} public key must be {} bytes, got {}",
                key_type.as_str(),
                key_type.public_key_len(),
                public_key.len()
            )));
        }

        kdf.validate()?;

        let mut plaintext = Zeroizing::new(Vec::with_capacity(SEED_LEN + public_key.len()));
        plaintext.extend_from_slice(seed);
        plaintext.extend_from_slice(public_key);
        let sealed = crypto::seal(&plaintext, password, &kdf)?;

        Ok(Self {
            address,
            encoded: STANDARD.encode(sealed),
            encoding: KeystoreEncoding {
                content: vec![CONTENT_SEED.to_string(), key_type.as_str().to_string()],
                kind: vec![KDF_ARGON2ID.to_string(), CIPHER_XCHACHA20_POLY1305.to_string()],
                version: KEYSTORE_VERSION.to_string(),
                kdf,
            },
            meta,
        })
    }

    /// Key type declared by the record, without decrypting anything.
    pub fn key_type(&self) -> Result<KeyType, KeystoreError> {
        match self.encoding.content.as_slice() {
            [content, scheme] if content == CONTENT_SEED => KeyType::parse(scheme)
                .ok_or_else(|| KeystoreError::UnsupportedEncoding(format!("key type {scheme}"))),
            other => Err(KeystoreError::UnsupportedEncoding(format!(
                "content {other:?}"
            ))),
        }
    }

    /// Decrypt the record. The caller is responsible for checking that the
    /// seed really produces `public_key`.
    pub fn open(&self, password: &Password) -> Result<KeystoreSecret, KeystoreError> {
        if self.encoding.version != KEYSTORE_VERSION {
            return Err(KeystoreError::UnsupportedEncoding(format!(
                "version {}",
                self.encoding.version
            )));
        }
        let expected_kind = [KDF_ARGON2ID, CIPHER_XCHACHA20_POLY1305];
        if self.encoding.kind != expected_kind {
            return Err(KeystoreError::UnsupportedEncoding(format!(
                "type {:?}",
                self.encoding.kind
            )));
        }
        let key_type = self.key_type()?;
        // Out-of-range costs are treated as a corrupted record, before any
        // hashing happens.
        self.encoding.kdf.validate().map_err(|_| KeystoreError::Decrypt)?;

        let sealed = STANDARD.decode(&self.encoded)?;
        let plaintext = crypto::open(&sealed, password, &self.encoding.kdf)?;

        // Authenticated but the wrong shape: treat like any other corruption.
        if plaintext.len() != SEED_LEN + key_type.public_key_len() {
            return Err(KeystoreError::Decrypt);
        }

        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        seed.copy_from_slice(&plaintext[..SEED_LEN]);
        Ok(KeystoreSecret {
            key_type,
            seed,
            public_key: plaintext[SEED_LEN..].to_vec(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, KeystoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, KeystoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pw: &str) -> KeystoreRecord {
        KeystoreRecord::seal(
            KeyType::Ed25519,
            &[7u8; SEED_LEN],
            &[9u8; 32],
            "5Address".to_string(),
            &Password::new(pw),
            KdfParams::insecure_for_tests(),
            KeystoreMeta {
                name: Some("test".into()),
                when_created: 1,
            },
        )
        .unwrap()
    }

    #[test]
    fn opens_with_the_right_password() {
        let secret = record("pw").open(&Password::new("pw")).unwrap();
        assert_eq!(secret.key_type, KeyType::Ed25519);
        assert_eq!(*secret.seed, [7u8; SEED_LEN]);
        assert_eq!(secret.public_key, vec![9u8; 32]);
    }

    #[test]
    fn excessive_kdf_costs_are_refused_without_hashing() {
        let mut rec = record("pw");
        rec.encoding.kdf.t_cost = u32::MAX;
        assert!(matches!(rec.open(&Password::new("pw")), Err(KeystoreError::Decrypt)));

        let mut rec = record("pw");
        rec.encoding.kdf.m_cost = u32::MAX;
        assert!(matches!(rec.open(&Password::new("pw")), Err(KeystoreError::Decrypt)));
    }

    #[test]
    fn kdf_limits() {
        assert!(KdfParams::default().validate().is_ok());
        assert!(KdfParams::MAX.validate().is_ok());
        let too_slow = KdfParams {
            t_cost: KdfParams::MAX.t_cost + 1,
            ..KdfParams::default()
        };
        assert!(matches!(too_slow.validate(), Err(KeystoreError::Kdf(_))));
        assert!(KeystoreRecord::seal(
            KeyType::Ed25519,
            &[7u8; SEED_LEN],
            &[9u8; 32],
            "5Address".to_string(),
            &Password::new("pw"),
            too_slow,
            KeystoreMeta::default(),
        )
        .is_err());
    }

    #[test]
    fn wrong_password_is_a_decrypt_error() {
        assert!(matches!(
            record("pw").open(&Password::new("nope")),
            Err(KeystoreError::Decrypt)
        ));
    }

    #[test]
    fn json_shape_uses_keyring_field_names() {
        let json = record("pw").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["encoding"]["type"][0], "argon2id");
        assert_eq!(value["encoding"]["content"][1], "ed25519");
        assert_eq!(value["encoding"]["kdf"]["mCost"], 8);
        assert_eq!(value["meta"]["whenCreated"], 1);
        let parsed = KeystoreRecord::from_json(&json).unwrap();
        assert_eq!(parsed.encoded, value["encoded"].as_str().unwrap());
    }

    #[test]
    fn rejects_unknown_encodings_before_decrypting() {
        let mut rec = record("pw");
        rec.encoding.version = "2".into();
        assert!(matches!(
            rec.open(&Password::new("pw")),
            Err(KeystoreError::UnsupportedEncoding(_))
        ));

        let mut rec = record("pw");
        rec.encoding.content = vec!["pkcs8".into(), "sr25519".into()];
        assert!(matches!(
            rec.key_type(),
            Err(KeystoreError::UnsupportedEncoding(_))
        ));

        let mut rec = record("pw");
        rec.encoding.kind = vec!["scrypt".into(), "xsalsa20-poly1305".into()];
        assert!(matches!(
            rec.open(&Password::new("pw")),
            Err(KeystoreError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn seal_checks_public_key_length() {
        let err = KeystoreRecord::seal(
            KeyType::Ecdsa,
            &[1u8; SEED_LEN],
            &[2u8; 32],
            "x".into(),
            &Password::new("pw"),
            KdfParams::insecure_for_tests(),
            KeystoreMeta::default(),
        );
        assert!(matches!(err, Err(KeystoreError::Malformed(_))));
    }

    #[test]
    fn kdf_params_are_validated() {
        assert!(KdfParams::default().validate().is_ok());
        assert!(KdfParams { m_cost: 1, t_cost: 0, p_cost: 0 }.validate().is_err());
    }
}
