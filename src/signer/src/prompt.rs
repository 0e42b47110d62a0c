use async_trait::async_trait;
use futures::channel::{mpsc, oneshot};
use serde::{Deserialize, Serialize};
use shared::Password;
use tracing::debug;

use crate::signers::{SignerError, SignerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub title: String,
    pub address: String,
}

/// Interactive password source. Resolves with the password, or fails with
/// `SignerError::Cancelled` when the user dismisses the prompt.
#[async_trait]
pub trait PasswordPrompt: Send + Sync {
    async fn prompt_password(&self, request: PromptRequest) -> SignerResult<Password>;
}

/// Always answers with the same password. For headless use and tests.
pub struct FixedPassword(Password);

impl FixedPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(Password::new(password))
    }
}

#[async_trait]
impl PasswordPrompt for FixedPassword {
    async fn prompt_password(&self, _request: PromptRequest) -> SignerResult<Password> {
        Ok(self.0.clone())
    }
}

/// A prompt waiting for the front end to answer it.
pub struct PendingPrompt {
    pub request: PromptRequest,
    reply: oneshot::Sender<Password>,
}

impl PendingPrompt {
    pub fn submit(self, password: Password) {
        if self.reply.send(password).is_err() {
            debug!("[prompt] caller stopped waiting for {}", self.request.address);
        }
    }

    /// Dismiss the prompt. Dropping it has the same effect.
    pub fn cancel(self) {}
}

/// Forwards prompt requests to whoever drives the UI, over a channel.
pub struct ChannelPrompt {
    tx: mpsc::UnboundedSender<PendingPrompt>,
}

impl ChannelPrompt {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PendingPrompt>) {
        let (tx, rx) = mpsc::unbounded();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl PasswordPrompt for ChannelPrompt {
    async fn prompt_password(&self, request: PromptRequest) -> SignerResult<Password> {
        let (reply, answer) = oneshot::channel();
        self.tx
            .unbounded_send(PendingPrompt { request, reply })
            .map_err(|_| SignerError::Cancelled)?;
        answer.await.map_err(|_| SignerError::Cancelled)
    }
}
