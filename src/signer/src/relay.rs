use std::sync::Arc;

use shared::{init_with_component, parse_level, KeyType, KeystoreRecord, Password, RelayConfig};
use tracing::info;

use crate::chain::ChainApi;
use crate::client::SignerClient;
use crate::prompt::PasswordPrompt;
use crate::service::SigningWorker;
use crate::signers::keypair::generate_account;
use crate::signers::{KeystoreSigner, SignerError, SignerResult};
use crate::store::{AccountStore, DirAccountStore, MemoryAccountStore};
use crate::submit::Submitter;

/// Worker thread plus the client wired to it, built from one `RelayConfig`.
pub struct SigningRelay {
    config: RelayConfig,
    client: Arc<SignerClient>,
    worker: Option<SigningWorker>,
}

impl SigningRelay {
    /// Must be called inside a tokio runtime (the client spawns its pump).
    pub fn start(config: RelayConfig) -> SignerResult<Self> {
        init_with_component(parse_level(&config.logging.level), "signing-relay");
        config.validate()?;

        let (worker, channels) = SigningWorker::spawn(&config.worker)?;
        let client = Arc::new(SignerClient::from_channels(channels, &config.client));

        info!(
            "[relay] started (ss58 prefix {}, timeout {} ms)",
            config.client.ss58_prefix, config.client.request_timeout_ms
        );
        Ok(Self {
            config,
            client,
            worker: Some(worker),
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn client(&self) -> Arc<SignerClient> {
        self.client.clone()
    }

    /// Directory-backed store when `keystore.directory` is set, otherwise an
    /// empty in-memory one.
    pub fn account_store(&self) -> Arc<dyn AccountStore> {
        match &self.config.keystore.directory {
            Some(dir) => Arc::new(DirAccountStore::new(dir)),
            None => Arc::new(MemoryAccountStore::new()),
        }
    }

    /// New random account sealed with the configured KDF costs.
    pub fn generate_account(
        &self,
        key_type: KeyType,
        password: &Password,
        name: Option<String>,
    ) -> SignerResult<KeystoreRecord> {
        generate_account(
            key_type,
            self.config.client.ss58_prefix,
            password,
            self.config.keystore.kdf,
            name,
        )
    }

    pub fn signer(
        &self,
        accounts: Arc<dyn AccountStore>,
        prompt: Arc<dyn PasswordPrompt>,
    ) -> Arc<KeystoreSigner> {
        Arc::new(KeystoreSigner::new(
            self.client.clone(),
            accounts,
            prompt,
            self.config.client.ss58_prefix,
        ))
    }

    pub fn submitter(
        &self,
        api: Arc<dyn ChainApi>,
        accounts: Arc<dyn AccountStore>,
        prompt: Arc<dyn PasswordPrompt>,
    ) -> Submitter {
        Submitter::new(api, self.signer(accounts, prompt))
    }

    /// Close the worker port and wait for the worker thread to exit.
    pub async fn shutdown(mut self) -> SignerResult<()> {
        self.client.close();
        if let Some(worker) = self.worker.take() {
            tokio::task::spawn_blocking(move || worker.join())
                .await
                .map_err(|e| SignerError::Other(format!("join worker: {e}")))??;
        }
        info!("[relay] stopped");
        Ok(())
    }
}

impl Drop for SigningRelay {
    fn drop(&mut self) {
        self.client.close();
    }
}
