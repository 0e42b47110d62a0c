//! Password-based sealing of keystore secrets
//!
//! Argon2id stretches the password into a 256-bit key, XChaCha20-Poly1305
//! encrypts and authenticates the secret. A sealed blob is
//! `salt[32] ++ nonce[24] ++ ciphertext ++ tag[16]`.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::types::{KdfParams, KeystoreError, Password};

pub const SALT_LEN: usize = 32;
pub const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;

type Result<T> = std::result::Result<T, KeystoreError>;

pub fn seal(plaintext: &[u8], password: &Password, params: &KdfParams) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt, params)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|e| KeystoreError::Malformed(format!("encryption failed: {e}")))?;

    let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a sealed blob. A wrong password and a tampered blob are
/// indistinguishable and both yield `KeystoreError::Decrypt`.
pub fn open(sealed: &[u8], password: &Password, params: &KdfParams) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(KeystoreError::Malformed(format!(
            "sealed secret too short: {} bytes",
            sealed.len()
        )));
    }
    let (salt, rest) = sealed.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(password, salt, params)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| KeystoreError::Decrypt)?;
    Ok(Zeroizing::new(plaintext))
}

fn derive_key(password: &Password, salt: &[u8], params: &KdfParams) -> Result<Zeroizing<[u8; 32]>> {
    let argon2_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(32))
        .map_err(|e| KeystoreError::Kdf(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password.expose().as_bytes(), salt, key.as_mut_slice())
        .map_err(|e| KeystoreError::Kdf(e.to_string()))?;
    Ok(key)
}
