use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::channel::mpsc;
use futures::StreamExt;
use rustc_hash::FxHashMap;
use shared::config::ClientConfig;
use shared::protocol::DECRYPTION_FAILED;
use shared::{KeystoreRecord, Password, Port, SignHexRequest, WorkerRequest, WorkerResponse};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::service::WorkerChannels;
use crate::signers::{SignerError, SignerResult};

type PendingTable = Arc<Mutex<FxHashMap<String, oneshot::Sender<WorkerResponse>>>>;

/// Main-context end of the signing worker port.
///
/// - writes `sign-hex` frames to the worker
/// - a single pump task reads the worker's responses and completes the
///   matching pending request by id, in whatever order they arrive
/// - every round-trip is bounded by `request_timeout_ms`; the pending entry
///   is removed when the caller stops waiting, whatever the reason
pub struct SignerClient {
    requests: Port,
    pending: PendingTable,
    timeout: Duration,
    pump: JoinHandle<()>,
}

/// Removes its pending entry on drop, so timeouts and dropped futures never
/// leave orphans behind.
struct PendingEntry {
    table: PendingTable,
    id: String,
}

impl Drop for PendingEntry {
    fn drop(&mut self) {
        if lock(&self.table).remove(&self.id).is_some() {
            debug!("[signer-client] dropped pending request {}", self.id);
        }
    }
}

fn lock(
    table: &PendingTable,
) -> MutexGuard<'_, FxHashMap<String, oneshot::Sender<WorkerResponse>>> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SignerClient {
    /// Build a client over a request port and the worker's response stream.
    /// Spawns the response pump, so it must be called inside a tokio runtime.
    pub fn new(
        requests: Port,
        responses: mpsc::UnboundedReceiver<Vec<u8>>,
        config: &ClientConfig,
    ) -> Self {
        let pending: PendingTable = Arc::new(Mutex::new(FxHashMap::default()));
        let pump = tokio::spawn(pump(responses, pending.clone()));

        info!(
            "[signer-client] initialized (timeout {} ms)",
            config.request_timeout_ms
        );
        Self {
            requests,
            pending,
            timeout: Duration::from_millis(config.request_timeout_ms),
            pump,
        }
    }

    pub fn from_channels(channels: WorkerChannels, config: &ClientConfig) -> Self {
        Self::new(channels.requests, channels.responses, config)
    }

    /// Ask the worker to decrypt `record` with `password` and sign
    /// `payload_hex`. Returns the hex signature.
    pub async fn request_signature(
        &self,
        ss58: u16,
        address: &str,
        record: KeystoreRecord,
        password: Password,
        payload_hex: &str,
    ) -> SignerResult<String> {
        let id = Uuid::new_v4().to_string();
        let frame = WorkerRequest::SignHex(SignHexRequest {
            id: id.clone(),
            ss58,
            address: address.to_string(),
            json: record,
            password,
            hex: payload_hex.to_string(),
        })
        .encode()?;

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id.clone(), tx);
        let _entry = PendingEntry {
            table: self.pending.clone(),
            id: id.clone(),
        };

        // `send` wipes the frame (and the password in it) when it bounces.
        if self.requests.send(frame).is_err() {
            warn!("[signer-client] worker port closed, request {id} not sent");
            return Err(SignerError::ChannelClosed);
        }
        debug!("[signer-client] dispatched request {id} for {address}");

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(SignerError::ChannelClosed),
            Err(_) => {
                warn!(
                    "[signer-client] request {id} timed out after {} ms",
                    self.timeout.as_millis()
                );
                return Err(SignerError::Timeout {
                    id,
                    after_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        match response {
            WorkerResponse::Signed { signature, .. } => Ok(signature),
            WorkerResponse::Error { message, .. } if message == DECRYPTION_FAILED => {
                Err(SignerError::WrongPassword)
            }
            WorkerResponse::Error { message, .. } => Err(SignerError::Worker(message)),
        }
    }

    /// Requests dispatched and still waiting for their response.
    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Close the request port. The worker finishes what it already
    /// received and then stops.
    pub fn close(&self) {
        self.requests.close();
    }
}

impl Drop for SignerClient {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn pump(mut responses: mpsc::UnboundedReceiver<Vec<u8>>, pending: PendingTable) {
    info!("[signer-client] response pump started");

    while let Some(bytes) = responses.next().await {
        let response = match WorkerResponse::decode(&bytes) {
            Ok(response) => response,
            Err(e) => {
                warn!("[signer-client] failed to parse response frame: {e}");
                continue;
            }
        };

        let waiter = lock(&pending).remove(response.id());
        match waiter {
            Some(tx) => {
                if tx.send(response).is_err() {
                    debug!("[signer-client] caller went away before its response");
                }
            }
            None => warn!(
                "[signer-client] response for unknown or expired request {}; discarded",
                response.id()
            ),
        }
    }

    let orphans: Vec<_> = lock(&pending).drain().collect();
    if !orphans.is_empty() {
        warn!(
            "[signer-client] response channel closed with {} requests pending",
            orphans.len()
        );
    }
    info!("[signer-client] response pump stopped");
}
