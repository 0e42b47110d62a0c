use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use ed25519_dalek::Signer as _;
use k256::ecdsa::{
    RecoveryId, Signature as EcdsaSignature, SigningKey as EcdsaSigningKey,
    VerifyingKey as EcdsaVerifyingKey,
};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use rand::RngCore;
use shared::types::{KeystoreMeta, SEED_LEN};
use shared::utils::blake2_256;
use shared::{KdfParams, KeyType, KeystoreError, KeystoreRecord, Password, Ss58Address};
use signature::hazmat::PrehashVerifier;
use tracing::info;
use zeroize::Zeroizing;

use super::{SignerError, SignerResult};

/// A signing keypair. Both variants wipe their secret scalar on drop.
pub enum Keypair {
    Ed25519(ed25519_dalek::SigningKey),
    Ecdsa(EcdsaSigningKey),
}

impl Keypair {
    pub fn from_seed(key_type: KeyType, seed: &[u8; SEED_LEN]) -> SignerResult<Self> {
        match key_type {
            KeyType::Ed25519 => Ok(Keypair::Ed25519(ed25519_dalek::SigningKey::from_bytes(seed))),
            KeyType::Ecdsa => EcdsaSigningKey::from_slice(seed)
                .map(Keypair::Ecdsa)
                .map_err(|e| SignerError::InvalidPrivateKey(e.to_string())),
        }
    }

    pub fn generate(key_type: KeyType) -> SignerResult<Self> {
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        OsRng.fill_bytes(seed.as_mut_slice());
        Self::from_seed(key_type, &seed)
    }

    /// Decrypt `record` and rebuild its keypair. Fails with
    /// `KeystoreError::Decrypt` when the password is wrong or the stored
    /// public key does not belong to the decrypted seed.
    pub fn unlock(record: &KeystoreRecord, password: &Password) -> SignerResult<Self> {
        let secret = record.open(password)?;
        let keypair = Self::from_seed(secret.key_type, &secret.seed)
            .map_err(|_| SignerError::Keystore(KeystoreError::Decrypt))?;
        if keypair.public_key() != secret.public_key {
            return Err(SignerError::Keystore(KeystoreError::Decrypt));
        }
        Ok(keypair)
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Keypair::Ed25519(_) => KeyType::Ed25519,
            Keypair::Ecdsa(_) => KeyType::Ecdsa,
        }
    }

    /// 32 bytes for ed25519, 33-byte compressed point for ecdsa.
    pub fn public_key(&self) -> Vec<u8> {
        match self {
            Keypair::Ed25519(key) => key.verifying_key().to_bytes().to_vec(),
            Keypair::Ecdsa(key) => key
                .verifying_key()
                .as_affine()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
        }
    }

    pub fn account_id(&self) -> [u8; 32] {
        account_id(self.key_type(), &self.public_key())
    }

    pub fn address(&self, ss58_prefix: u16) -> SignerResult<String> {
        Ok(Ss58Address::new(ss58_prefix, self.account_id())?.encode())
    }

    /// ed25519 signs the message itself (64 bytes). ecdsa signs its
    /// blake2-256 digest and appends the recovery id (65 bytes).
    pub fn sign(&self, message: &[u8]) -> SignerResult<Vec<u8>> {
        match self {
            Keypair::Ed25519(key) => Ok(key.sign(message).to_bytes().to_vec()),
            Keypair::Ecdsa(key) => {
                let prehash = blake2_256(message);
                let (signature, recovery_id) = key
                    .sign_prehash_recoverable(&prehash)
                    .map_err(|e| SignerError::CryptoError(format!("ecdsa sign failed: {e}")))?;
                let mut out = signature.to_bytes().to_vec();
                out.push(recovery_id.to_byte());
                Ok(out)
            }
        }
    }

    fn seed(&self) -> Zeroizing<[u8; SEED_LEN]> {
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        match self {
            Keypair::Ed25519(key) => seed.copy_from_slice(&key.to_bytes()),
            Keypair::Ecdsa(key) => seed.copy_from_slice(&key.to_bytes()),
        }
        seed
    }

    /// Seal this keypair into an encrypted keystore record for `ss58_prefix`.
    pub fn to_record(
        &self,
        ss58_prefix: u16,
        password: &Password,
        kdf: KdfParams,
        name: Option<String>,
    ) -> SignerResult<KeystoreRecord> {
        let address = self.address(ss58_prefix)?;
        let when_created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        let record = KeystoreRecord::seal(
            self.key_type(),
            &self.seed(),
            &self.public_key(),
            address,
            password,
            kdf,
            KeystoreMeta { name, when_created },
        )?;
        info!(
            "[keyring] sealed {} account {}",
            self.key_type().as_str(),
            record.address
        );
        Ok(record)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("type", &self.key_type())
            .field("public", &hex::encode(self.public_key()))
            .finish()
    }
}

/// Seal an account from a known seed.
pub fn create_account(
    key_type: KeyType,
    seed: &[u8; SEED_LEN],
    ss58_prefix: u16,
    password: &Password,
    kdf: KdfParams,
    name: Option<String>,
) -> SignerResult<KeystoreRecord> {
    Keypair::from_seed(key_type, seed)?.to_record(ss58_prefix, password, kdf, name)
}

/// Create a fresh random account and return its encrypted record.
pub fn generate_account(
    key_type: KeyType,
    ss58_prefix: u16,
    password: &Password,
    kdf: KdfParams,
    name: Option<String>,
) -> SignerResult<KeystoreRecord> {
    Keypair::generate(key_type)?.to_record(ss58_prefix, password, kdf, name)
}

/// The 32-byte account id an address encodes: the key itself for ed25519,
/// its blake2-256 hash for 33-byte ecdsa keys.
pub fn account_id(key_type: KeyType, public_key: &[u8]) -> [u8; 32] {
    match key_type {
        KeyType::Ed25519 if public_key.len() == 32 => {
            let mut id = [0u8; 32];
            id.copy_from_slice(public_key);
            id
        }
        _ => blake2_256(public_key),
    }
}

/// Check `signature` over `message` for the given public key.
pub fn verify(key_type: KeyType, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    match key_type {
        KeyType::Ed25519 => {
            let Ok(pk) = <[u8; 32]>::try_from(public_key) else {
                return false;
            };
            let Ok(vk) = ed25519_dalek::VerifyingKey::from_bytes(&pk) else {
                return false;
            };
            let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                return false;
            };
            vk.verify_strict(message, &sig).is_ok()
        }
        KeyType::Ecdsa => {
            if signature.len() != 65 {
                return false;
            }
            let Ok(vk) = EcdsaVerifyingKey::from_sec1_bytes(public_key) else {
                return false;
            };
            let Ok(sig) = EcdsaSignature::from_slice(&signature[..64]) else {
                return false;
            };
            let Some(recovery_id) = RecoveryId::from_byte(signature[64]) else {
                return false;
            };
            let prehash = blake2_256(message);
            if vk.verify_prehash(&prehash, &sig).is_err() {
                return false;
            }
            EcdsaVerifyingKey::recover_from_prehash(&prehash, &sig, recovery_id)
                .map(|recovered| recovered == vk)
                .unwrap_or(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kdf() -> KdfParams {
        KdfParams::insecure_for_tests()
    }

    #[test]
    fn signatures_verify_for_both_schemes() {
        for key_type in [KeyType::Ed25519, KeyType::Ecdsa] {
            let pair = Keypair::generate(key_type).unwrap();
            let sig = pair.sign(b"payload").unwrap();
            assert!(verify(key_type, &pair.public_key(), b"payload", &sig));
            assert!(!verify(key_type, &pair.public_key(), b"other", &sig));
        }
    }

    #[test]
    fn signature_lengths() {
        let ed = Keypair::from_seed(KeyType::Ed25519, &[3u8; 32]).unwrap();
        let ec = Keypair::from_seed(KeyType::Ecdsa, &[3u8; 32]).unwrap();
        assert_eq!(ed.sign(b"m").unwrap().len(), 64);
        assert_eq!(ec.sign(b"m").unwrap().len(), 65);
        assert_eq!(ed.public_key().len(), 32);
        assert_eq!(ec.public_key().len(), 33);
    }

    #[test]
    fn ecdsa_rejects_zero_seed() {
        assert!(matches!(
            Keypair::from_seed(KeyType::Ecdsa, &[0u8; 32]),
            Err(SignerError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn record_unlocks_to_the_same_keypair() {
        let pair = Keypair::from_seed(KeyType::Ecdsa, &[5u8; 32]).unwrap();
        let pw = Password::new("pw");
        let record = pair.to_record(42, &pw, kdf(), Some("alice".into())).unwrap();
        assert_eq!(record.address, pair.address(42).unwrap());
        assert_eq!(record.meta.name.as_deref(), Some("alice"));

        let unlocked = Keypair::unlock(&record, &pw).unwrap();
        assert_eq!(unlocked.public_key(), pair.public_key());
    }

    #[test]
    fn unlock_with_wrong_password_fails() {
        let record = generate_account(KeyType::Ed25519, 42, &Password::new("pw"), kdf(), None).unwrap();
        assert!(matches!(
            Keypair::unlock(&record, &Password::new("wrong")),
            Err(SignerError::Keystore(KeystoreError::Decrypt))
        ));
    }

    #[test]
    fn unlock_detects_swapped_public_key() {
        let pw = Password::new("pw");
        let record = KeystoreRecord::seal(
            KeyType::Ed25519,
            &[1u8; 32],
            &[0u8; 32],
            "x".into(),
            &pw,
            kdf(),
            KeystoreMeta::default(),
        )
        .unwrap();
        assert!(matches!(
            Keypair::unlock(&record, &pw),
            Err(SignerError::Keystore(KeystoreError::Decrypt))
        ));
    }

    #[test]
    fn debug_does_not_print_the_seed() {
        let pair = Keypair::from_seed(KeyType::Ed25519, &[0xab; 32]).unwrap();
        assert!(!format!("{pair:?}").contains(&"ab".repeat(32)));
    }
}
