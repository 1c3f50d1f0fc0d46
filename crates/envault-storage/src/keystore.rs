//! Device key persistence
//!
//! The on-disk shape is a JSON object with base-58 encoded key material and
//! millisecond-epoch timestamps. It is not encrypted at rest; protection
//! relies on the filesystem permissions of the user's home directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Persisted form of the device key pair
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceKeyRecord {
    /// Base-58 encoded KEM public key
    pub public_key: String,
    /// Base-58 encoded KEM secret key
    pub private_key: String,
    /// Milliseconds since epoch
    pub created_at: i64,
    /// Milliseconds since epoch
    pub expires_at: i64,
}

/// Backing store for the device key record
///
/// Injected into the lifecycle manager so tests can run against an
/// in-memory implementation instead of the user's config directory.
pub trait KeyStore {
    /// Load the persisted record, if any. A missing record is `Ok(None)`;
    /// unreadable or unparseable content is [`Error::CorruptRecord`].
    fn load(&self) -> Result<Option<DeviceKeyRecord>>;

    /// Persist the record, replacing any previous one.
    fn save(&self, record: &DeviceKeyRecord) -> Result<()>;

    /// Remove the persisted record. Removing a missing record is not an
    /// error.
    fn delete(&self) -> Result<()>;
}

/// JSON file store at a fixed per-user configuration location
///
/// No lock is taken on the file: two concurrent first-use invocations may
/// race to generate and persist two different key pairs, and the last
/// writer wins silently.
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    /// Store backed by an explicit file path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at the fixed per-user location
    /// (`<config dir>/envault/device_key.json`)
    pub fn at_default_location() -> Result<Self> {
        let config_dir = dirs::config_dir().ok_or(Error::NoConfigDir)?;
        Ok(Self::new(config_dir.join("envault").join("device_key.json")))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for FileKeyStore {
    fn load(&self) -> Result<Option<DeviceKeyRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Storage(e)),
        };

        let record: DeviceKeyRecord =
            serde_json::from_str(&content).map_err(|e| Error::CorruptRecord(e.to_string()))?;
        Ok(Some(record))
    }

    fn save(&self, record: &DeviceKeyRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(e)),
        }
    }
}

/// In-memory store for tests
#[derive(Default)]
pub struct MemoryKeyStore {
    record: Mutex<Option<DeviceKeyRecord>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a record, as if one had been persisted earlier
    pub fn with_record(record: DeviceKeyRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl KeyStore for MemoryKeyStore {
    fn load(&self) -> Result<Option<DeviceKeyRecord>> {
        let guard = self.record.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, record: &DeviceKeyRecord) -> Result<()> {
        let mut guard = self.record.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(record.clone());
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        let mut guard = self.record.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DeviceKeyRecord {
        DeviceKeyRecord {
            public_key: "3mJr7AoUXx2Wqd".to_string(),
            private_key: "4Yh9KjP2nRsTuv".to_string(),
            created_at: 1_700_000_000_000,
            expires_at: 1_700_604_800_000,
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("device_key.json"));

        assert!(store.load().unwrap().is_none());

        let record = sample_record();
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap(), Some(record));

        store.delete().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("nested").join("device_key.json"));

        store.save(&sample_record()).unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_file_store_reports_invalid_json_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device_key.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileKeyStore::new(&path);
        assert!(matches!(store.load(), Err(Error::CorruptRecord(_))));
    }

    #[test]
    fn test_file_store_reports_wrong_shape_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device_key.json");
        std::fs::write(&path, r#"{"publicKey": "abc"}"#).unwrap();

        let store = FileKeyStore::new(&path);
        assert!(matches!(store.load(), Err(Error::CorruptRecord(_))));
    }

    #[test]
    fn test_file_store_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("device_key.json"));

        store.delete().unwrap();
        store.delete().unwrap();
    }

    #[test]
    fn test_record_is_camel_case_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device_key.json");
        let store = FileKeyStore::new(&path);

        store.save(&sample_record()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        assert!(content.contains("\"publicKey\""));
        assert!(content.contains("\"privateKey\""));
        assert!(content.contains("\"createdAt\""));
        assert!(content.contains("\"expiresAt\""));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryKeyStore::new();
        assert!(store.load().unwrap().is_none());

        let record = sample_record();
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap(), Some(record));

        store.delete().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
