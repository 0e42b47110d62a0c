use std::thread::{self, JoinHandle};

use futures::channel::mpsc;
use futures::executor::block_on_stream;
use shared::config::WorkerConfig;
use shared::protocol::{peek_id, DECRYPTION_FAILED};
use shared::utils::{decode_hex, encode_hex};
use shared::{KeystoreError, Port, SignHexRequest, Ss58Address, WorkerRequest, WorkerResponse};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::signers::{Keypair, SignerError, SignerResult};

pub const ADDRESS_MISMATCH: &str = "keystore does not match address";
pub const INVALID_PAYLOAD_HEX: &str = "invalid payload hex";
pub const UNSUPPORTED_ENCODING: &str = "unsupported keystore encoding";
pub const INVALID_REQUEST: &str = "invalid request frame";
pub const SIGNING_FAILED: &str = "signing failed";

/// Ports the main context uses to talk to a running worker.
pub struct WorkerChannels {
    /// `sign-hex` frames in.
    pub requests: Port,
    /// `signed` / `error` frames out.
    pub responses: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// The isolated signing context: one OS thread that owns no state between
/// requests. Keys are rebuilt per request and dropped before the response
/// is sent.
pub struct SigningWorker {
    thread: Option<JoinHandle<()>>,
}

impl SigningWorker {
    pub fn spawn(config: &WorkerConfig) -> SignerResult<(SigningWorker, WorkerChannels)> {
        let (request_port, inbox) = Port::channel();
        let (response_port, responses) = Port::channel();

        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run(inbox, response_port))?;

        info!("[signing-worker] spawned thread {}", config.thread_name);
        Ok((
            SigningWorker {
                thread: Some(thread),
            },
            WorkerChannels {
                requests: request_port,
                responses,
            },
        ))
    }

    /// Wait for the worker to drain its inbox and exit. Only returns once
    /// every request port clone has been dropped or closed.
    pub fn join(mut self) -> SignerResult<()> {
        match self.thread.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SignerError::Worker("worker thread panicked".to_string())),
            None => Ok(()),
        }
    }
}

fn run(inbox: mpsc::UnboundedReceiver<Vec<u8>>, out: Port) {
    for mut frame in block_on_stream(inbox) {
        let response = handle_frame(&frame);
        frame.zeroize();

        let Some(response) = response else {
            continue;
        };
        let bytes = match response.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("[signing-worker] failed to encode response: {e}");
                continue;
            }
        };
        if out.send(bytes).is_err() {
            info!("[signing-worker] response port closed, stopping");
            return;
        }
    }
    info!("[signing-worker] request port closed, stopping");
}

fn handle_frame(frame: &[u8]) -> Option<WorkerResponse> {
    match WorkerRequest::decode(frame) {
        Ok(WorkerRequest::SignHex(request)) => Some(sign_hex(&request)),
        Err(_) => match peek_id(frame) {
            Some(id) => {
                warn!("[signing-worker] undecodable request {id}");
                Some(WorkerResponse::Error {
                    id,
                    message: INVALID_REQUEST.to_string(),
                })
            }
            None => {
                warn!(
                    "[signing-worker] dropping {} byte frame without id",
                    frame.len()
                );
                None
            }
        },
    }
}

/// Decrypt, sign, forget. Always yields exactly one response for the
/// request id, and never puts key material or the password in it.
pub fn sign_hex(request: &SignHexRequest) -> WorkerResponse {
    let id = request.id.clone();
    match try_sign_hex(request) {
        Ok(signature) => {
            debug!("[signing-worker] signed request {id}");
            WorkerResponse::Signed {
                id,
                signature: encode_hex(&signature),
            }
        }
        Err(reason) => {
            debug!("[signing-worker] request {id} failed: {reason}");
            WorkerResponse::Error {
                id,
                message: reason.to_string(),
            }
        }
    }
}

fn try_sign_hex(request: &SignHexRequest) -> Result<Vec<u8>, &'static str> {
    let payload = decode_hex(&request.hex).map_err(|_| INVALID_PAYLOAD_HEX)?;

    let keypair = Keypair::unlock(&request.json, &request.password).map_err(failure_reason)?;

    let address = Ss58Address::new(request.ss58, keypair.account_id())
        .map_err(|_| ADDRESS_MISMATCH)?
        .encode();
    if address != request.address {
        return Err(ADDRESS_MISMATCH);
    }

    keypair.sign(&payload).map_err(|_| SIGNING_FAILED)
}

fn failure_reason(err: SignerError) -> &'static str {
    match err {
        SignerError::Keystore(KeystoreError::UnsupportedEncoding(_)) => UNSUPPORTED_ENCODING,
        _ => DECRYPTION_FAILED,
    }
}
