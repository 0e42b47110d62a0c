use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shared::utils::{decode_hex, encode_hex};
use tracing::{debug, info};

use super::types::{SignatureResult, Signer, SignerPayload, SignerPayloadRaw};
use super::SignerResult;
use crate::client::SignerClient;
use crate::prompt::{PasswordPrompt, PromptRequest};
use crate::store::AccountStore;

const PROMPT_TITLE: &str = "Confirm transaction";

/// `Signer` handed to the chain library. Holds no key material: every call
/// prompts for the password, loads the encrypted record and lets the
/// signing worker do the rest.
pub struct KeystoreSigner {
    client: Arc<SignerClient>,
    accounts: Arc<dyn AccountStore>,
    prompt: Arc<dyn PasswordPrompt>,
    ss58: u16,
    next_id: AtomicU64,
}

impl KeystoreSigner {
    pub fn new(
        client: Arc<SignerClient>,
        accounts: Arc<dyn AccountStore>,
        prompt: Arc<dyn PasswordPrompt>,
        ss58: u16,
    ) -> Self {
        Self {
            client,
            accounts,
            prompt,
            ss58,
            next_id: AtomicU64::new(1),
        }
    }

    /// password -> keystore -> worker. Returns the bare signature and the
    /// multi-signature type byte of the account's scheme.
    async fn sign_bytes(&self, address: &str, message: &[u8]) -> SignerResult<(Vec<u8>, u8)> {
        let password = self
            .prompt
            .prompt_password(PromptRequest {
                title: PROMPT_TITLE.to_string(),
                address: address.to_string(),
            })
            .await?;

        let record = self.accounts.get_account_json(address).await?;
        let type_byte = record.key_type()?.signature_type_byte();

        let signature = self
            .client
            .request_signature(self.ss58, address, record, password, &encode_hex(message))
            .await?;
        debug!("[keystore-signer] signed {} bytes for {address}", message.len());
        Ok((decode_hex(&signature)?, type_byte))
    }

    fn fallback_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl Signer for KeystoreSigner {
    async fn sign_payload(&self, payload: &SignerPayload) -> SignerResult<SignatureResult> {
        let message = payload.signing_bytes()?;
        let (signature, type_byte) = self.sign_bytes(&payload.address, &message).await?;

        let mut multi = Vec::with_capacity(signature.len() + 1);
        multi.push(type_byte);
        multi.extend_from_slice(&signature);

        let id = match payload.nonce {
            Some(nonce) if nonce > 0 => nonce,
            _ => self.fallback_id(),
        };
        info!("[keystore-signer] payload signed for {} (id {id})", payload.address);
        Ok(SignatureResult {
            id,
            signature: encode_hex(&multi),
        })
    }

    async fn sign_raw(&self, raw: &SignerPayloadRaw) -> SignerResult<SignatureResult> {
        let message = decode_hex(&raw.data)?;
        let (signature, _) = self.sign_bytes(&raw.address, &message).await?;

        let id = self.fallback_id();
        info!("[keystore-signer] raw data signed for {} (id {id})", raw.address);
        Ok(SignatureResult {
            id,
            signature: encode_hex(&signature),
        })
    }
}

impl std::fmt::Debug for KeystoreSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreSigner")
            .field("ss58", &self.ss58)
            .finish_non_exhaustive()
    }
}
