use std::sync::Arc;

use futures::StreamExt;
use tracing::{info, warn};

use crate::chain::{ChainApi, SubmissionStatus, UnsignedExtrinsic};
use crate::signers::{Signer, SignerError, SignerResult};

/// A chain handle with its signer bound explicitly. Two submitters over the
/// same `ChainApi` with different signers never interfere.
#[derive(Clone)]
pub struct Submitter {
    api: Arc<dyn ChainApi>,
    signer: Arc<dyn Signer>,
}

impl Submitter {
    pub fn new(api: Arc<dyn ChainApi>, signer: Arc<dyn Signer>) -> Self {
        Self { api, signer }
    }

    pub fn api(&self) -> &Arc<dyn ChainApi> {
        &self.api
    }

    /// Build an extrinsic with `build`, sign it as `address`, submit it and
    /// wait for inclusion. Resolves with the hash of the first in-block or
    /// finalized block reported. Every status, including the last one, is
    /// passed to `on_status` first.
    ///
    /// One-shot: nothing is retried.
    pub async fn sign_and_send<F>(
        &self,
        build: F,
        address: Option<&str>,
        mut on_status: Option<&mut (dyn FnMut(&SubmissionStatus) + Send)>,
    ) -> SignerResult<String>
    where
        F: FnOnce(&dyn ChainApi) -> SignerResult<UnsignedExtrinsic>,
    {
        if !self.api.is_ready() {
            return Err(SignerError::ChainNotReady);
        }
        let address = match address {
            Some(address) if !address.is_empty() => address,
            _ => return Err(SignerError::NotAuthenticated),
        };

        let extrinsic = build(self.api.as_ref())?;
        info!(
            "[submitter] {}.{} from {address}",
            extrinsic.section, extrinsic.method
        );

        let mut statuses = self
            .api
            .sign_and_send(extrinsic, address, self.signer.clone())
            .await?;

        while let Some(status) = statuses.next().await {
            if let Some(observer) = on_status.as_deref_mut() {
                observer(&status);
            }
            if let Some(block) = status.block_reference() {
                info!("[submitter] included in {block}");
                return Ok(block.to_string());
            }
            if let Some(reason) = status.failure() {
                warn!("[submitter] submission failed: {reason}");
                return Err(SignerError::Submission(reason));
            }
        }
        Err(SignerError::StreamEnded)
    }
}
