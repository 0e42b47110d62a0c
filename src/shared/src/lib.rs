pub mod config;
pub mod port;
pub mod protocol;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use config::{ConfigError, RelayConfig};
pub use port::{Port, PortError};
pub use protocol::{ProtocolError, SignHexRequest, WorkerRequest, WorkerResponse};
pub use telemetry::*;
pub use types::{
    AddressError, KdfParams, KeyType, KeystoreError, KeystoreRecord, Password, Ss58Address,
};
