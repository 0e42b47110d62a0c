use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use shared::{KeystoreRecord, Ss58Address};
use tracing::{debug, info};

use crate::signers::{SignerError, SignerResult};

/// Local credential store: address -> encrypted keystore record.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_account_json(&self, address: &str) -> SignerResult<KeystoreRecord>;
}

#[derive(Default)]
pub struct MemoryAccountStore {
    records: RwLock<FxHashMap<String, KeystoreRecord>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: KeystoreRecord) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(record.address.clone(), record);
    }

    pub fn remove(&self, address: &str) -> Option<KeystoreRecord> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.remove(address)
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get_account_json(&self, address: &str) -> SignerResult<KeystoreRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records
            .get(address)
            .cloned()
            .ok_or_else(|| SignerError::AccountNotFound(address.to_string()))
    }
}

/// Records stored as `<address>.json` files in one directory.
pub struct DirAccountStore {
    dir: PathBuf,
}

impl DirAccountStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Only well-formed SS58 strings become file names.
    fn path_for(&self, address: &str) -> SignerResult<PathBuf> {
        Ss58Address::decode(address)?;
        Ok(self.dir.join(format!("{address}.json")))
    }

    pub async fn save(&self, record: &KeystoreRecord) -> SignerResult<()> {
        let path = self.path_for(&record.address)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, record.to_json()?).await?;
        info!("[account-store] saved {}", record.address);
        Ok(())
    }
}

#[async_trait]
impl AccountStore for DirAccountStore {
    async fn get_account_json(&self, address: &str) -> SignerResult<KeystoreRecord> {
        let path = self
            .path_for(address)
            .map_err(|_| SignerError::AccountNotFound(address.to_string()))?;

        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SignerError::AccountNotFound(address.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        debug!("[account-store] loaded {}", path.display());
        Ok(KeystoreRecord::from_json(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signers::keypair::create_account;
    use shared::{KdfParams, KeyType, Password};

    fn record() -> KeystoreRecord {
        create_account(
            KeyType::Ed25519,
            &[8u8; 32],
            42,
            &Password::new("pw"),
            KdfParams::insecure_for_tests(),
            Some("test".into()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn memory_store_lookup() {
        let store = MemoryAccountStore::new();
        let record = record();
        store.insert(record.clone());

        assert_eq!(store.get_account_json(&record.address).await.unwrap(), record);
        assert!(matches!(
            store.get_account_json("5Missing").await,
            Err(SignerError::AccountNotFound(_))
        ));
        assert!(store.remove(&record.address).is_some());
    }

    #[tokio::test]
    async fn dir_store_saves_and_loads() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirAccountStore::new(tmp.path().join("accounts"));
        let record = record();

        store.save(&record).await.unwrap();
        assert!(store.dir().join(format!("{}.json", record.address)).exists());
        assert_eq!(store.get_account_json(&record.address).await.unwrap(), record);
    }

    #[tokio::test]
    async fn dir_store_rejects_unknown_and_non_address_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirAccountStore::new(tmp.path());
        let missing = record().address;

        assert!(matches!(
            store.get_account_json(&missing).await,
            Err(SignerError::AccountNotFound(_))
        ));
        assert!(matches!(
            store.get_account_json("../../etc/passwd").await,
            Err(SignerError::AccountNotFound(_))
        ));
    }
}
