//! Device key lifecycle manager
//!
//! One long-lived key pair per machine, states Absent / Valid / Expired.
//! Expiry is enforced lazily on every read: a pair past its expiry is
//! deleted and regenerated, never returned. Corrupt persisted state is
//! treated the same as absent. Storage failures (no writable location)
//! are the one condition that surfaces to the caller.

use chrono::Utc;

use envault_core::codec;
use envault_core::crypto::kem::{KemKeyPair, KemPublicKey};

use crate::error::{Error, Result};
use crate::keystore::{DeviceKeyRecord, KeyStore};

/// Device key lifetime: 7 days, in milliseconds
pub const DEVICE_KEY_LIFETIME_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// The machine's long-lived key pair with its validity window
pub struct DeviceKeyPair {
    keypair: KemKeyPair,
    created_at: i64,
    expires_at: i64,
}

impl DeviceKeyPair {
    /// The underlying KEM key pair
    pub fn keypair(&self) -> &KemKeyPair {
        &self.keypair
    }

    /// Public half, for sharing with senders
    pub fn public_key(&self) -> KemPublicKey {
        self.keypair.public_key()
    }

    /// Creation time, milliseconds since epoch
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Expiry time, milliseconds since epoch
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }
}

/// Owns the device key pair behind an injected [`KeyStore`]
pub struct DeviceKeyManager<S: KeyStore> {
    store: S,
}

impl<S: KeyStore> DeviceKeyManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the valid device key pair, generating one if the persisted
    /// record is absent, corrupt, or expired
    ///
    /// This is the only mutating entry point.
    pub fn get_or_create(&self) -> Result<DeviceKeyPair> {
        let now = Utc::now().timestamp_millis();

        match self.store.load() {
            Ok(Some(record)) => match decode_record(&record) {
                Ok(pair) if now > pair.expires_at => {
                    tracing::info!("device key expired, generating a new pair");
                    self.store.delete()?;
                    self.generate(now)
                }
                Ok(pair) => Ok(pair),
                Err(e) => {
                    tracing::warn!("device key record is corrupt ({e}), regenerating");
                    self.store.delete()?;
                    self.generate(now)
                }
            },
            Ok(None) => self.generate(now),
            Err(Error::CorruptRecord(e)) => {
                tracing::warn!("device key record is corrupt ({e}), regenerating");
                self.store.delete()?;
                self.generate(now)
            }
            Err(e) => Err(e),
        }
    }

    fn generate(&self, now: i64) -> Result<DeviceKeyPair> {
        let keypair = KemKeyPair::generate();
        let pair = DeviceKeyPair {
            keypair,
            created_at: now,
            expires_at: now + DEVICE_KEY_LIFETIME_MS,
        };

        self.store.save(&encode_record(&pair))?;
        Ok(pair)
    }
}

fn encode_record(pair: &DeviceKeyPair) -> DeviceKeyRecord {
    DeviceKeyRecord {
        public_key: codec::encode(&pair.keypair.public_key_bytes()),
        private_key: codec::encode(&pair.keypair.secret_key_bytes()),
        created_at: pair.created_at,
        expires_at: pair.expires_at,
    }
}

fn decode_record(record: &DeviceKeyRecord) -> Result<DeviceKeyPair> {
    // expiresAt must lie strictly after createdAt for the record to be sane
    if record.expires_at <= record.created_at {
        return Err(Error::CorruptRecord(format!(
            "expiry {} is not after creation {}",
            record.expires_at, record.created_at
        )));
    }

    let public_bytes =
        codec::decode(&record.public_key).map_err(|e| Error::CorruptRecord(e.to_string()))?;
    let secret_bytes =
        codec::decode(&record.private_key).map_err(|e| Error::CorruptRecord(e.to_string()))?;

    let keypair = KemKeyPair::from_bytes(&public_bytes, &secret_bytes)
        .map_err(|e| Error::CorruptRecord(e.to_string()))?;

    Ok(DeviceKeyPair {
        keypair,
        created_at: record.created_at,
        expires_at: record.expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{FileKeyStore, MemoryKeyStore};

    fn expired_record() -> DeviceKeyRecord {
        let keypair = KemKeyPair::generate();
        let now = Utc::now().timestamp_millis();
        DeviceKeyRecord {
            public_key: codec::encode(&keypair.public_key_bytes()),
            private_key: codec::encode(&keypair.secret_key_bytes()),
            created_at: now - 8 * 24 * 60 * 60 * 1000,
            expires_at: now - 24 * 60 * 60 * 1000,
        }
    }

    #[test]
    fn test_absent_state_generates_and_persists() {
        let manager = DeviceKeyManager::new(MemoryKeyStore::new());

        let pair = manager.get_or_create().unwrap();

        assert!(pair.expires_at() > pair.created_at());
        assert_eq!(
            pair.expires_at() - pair.created_at(),
            DEVICE_KEY_LIFETIME_MS
        );
        assert!(manager.store().load().unwrap().is_some());
    }

    #[test]
    fn test_valid_state_returns_persisted_pair_unchanged() {
        let manager = DeviceKeyManager::new(MemoryKeyStore::new());

        let first = manager.get_or_create().unwrap();
        let second = manager.get_or_create().unwrap();

        assert_eq!(first.created_at(), second.created_at());
        assert_eq!(
            first.keypair().public_key_bytes(),
            second.keypair().public_key_bytes()
        );
    }

    #[test]
    fn test_expired_pair_is_never_reused() {
        let old = expired_record();
        let manager = DeviceKeyManager::new(MemoryKeyStore::with_record(old.clone()));

        let fresh = manager.get_or_create().unwrap();

        assert!(fresh.created_at() > old.created_at);
        assert_ne!(
            codec::encode(&fresh.keypair().public_key_bytes()),
            old.public_key
        );

        // The regenerated record replaced the expired one on disk
        let persisted = manager.store().load().unwrap().unwrap();
        assert_eq!(persisted.created_at, fresh.created_at());
    }

    #[test]
    fn test_corrupt_key_material_regenerates() {
        let record = DeviceKeyRecord {
            public_key: "tooshort".to_string(),
            private_key: "alsoshort".to_string(),
            created_at: 0,
            expires_at: i64::MAX,
        };
        let manager = DeviceKeyManager::new(MemoryKeyStore::with_record(record));

        let pair = manager.get_or_create().unwrap();
        assert!(pair.expires_at() > pair.created_at());
    }

    #[test]
    fn test_inverted_validity_window_regenerates() {
        let keypair = KemKeyPair::generate();
        let record = DeviceKeyRecord {
            public_key: codec::encode(&keypair.public_key_bytes()),
            private_key: codec::encode(&keypair.secret_key_bytes()),
            created_at: 2_000,
            expires_at: 1_000,
        };
        let manager = DeviceKeyManager::new(MemoryKeyStore::with_record(record));

        let pair = manager.get_or_create().unwrap();
        assert!(pair.expires_at() > pair.created_at());
    }

    #[test]
    fn test_corrupt_file_regenerates_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device_key.json");
        std::fs::write(&path, "definitely not json").unwrap();

        let manager = DeviceKeyManager::new(FileKeyStore::new(&path));
        let pair = manager.get_or_create().unwrap();

        assert!(pair.expires_at() > pair.created_at());

        // The file now holds the regenerated record
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"publicKey\""));
    }

    #[test]
    fn test_round_trip_through_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DeviceKeyManager::new(FileKeyStore::new(dir.path().join("key.json")));

        let first = manager.get_or_create().unwrap();
        let second = manager.get_or_create().unwrap();

        assert_eq!(
            first.keypair().public_key_bytes(),
            second.keypair().public_key_bytes()
        );
        assert_eq!(
            first.keypair().secret_key_bytes(),
            second.keypair().secret_key_bytes()
        );
    }
}
