//! Types shared by both sides of the signing relay: SS58 addresses, the
//! encrypted keystore record and the transient password.

pub mod address;
pub mod keystore;
pub mod secret;

pub use address::{AddressError, Ss58Address, DEFAULT_SS58_PREFIX};
pub use keystore::{
    KdfParams, KeyType, KeystoreEncoding, KeystoreError, KeystoreMeta, KeystoreRecord,
    KeystoreSecret, SEED_LEN,
};
pub use secret::Password;
