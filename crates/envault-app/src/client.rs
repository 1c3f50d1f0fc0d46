//! Envault client - seal for a recipient, open with the device key

use envault_core::codec;
use envault_core::crypto::kem::KemPublicKey;
use envault_core::exchange::{self, ExchangeToken};
use envault_core::secrets::SecretSet;
use envault_storage::{DeviceKeyManager, FileKeyStore, KeyStore};

use crate::error::Result;

/// Client composing the exchange core with the device key lifecycle
pub struct EnvaultClient<S: KeyStore> {
    keys: DeviceKeyManager<S>,
}

impl EnvaultClient<FileKeyStore> {
    /// Client backed by the per-user device key file
    pub fn new() -> Result<Self> {
        let store = FileKeyStore::at_default_location()?;
        Ok(Self::with_store(store))
    }
}

impl<S: KeyStore> EnvaultClient<S> {
    /// Client backed by an explicit key store (in-memory in tests)
    pub fn with_store(store: S) -> Self {
        Self {
            keys: DeviceKeyManager::new(store),
        }
    }

    /// This machine's device public key, base-58 encoded
    ///
    /// Generates the device key pair on first use.
    pub fn public_key(&self) -> Result<String> {
        let pair = self.keys.get_or_create()?;
        Ok(codec::encode(&pair.public_key().to_bytes()))
    }

    /// Seal a secret set for the holder of `recipient_key` and return the
    /// single-line token to hand over
    pub fn seal_for(&self, secrets: &SecretSet, recipient_key: &str) -> Result<String> {
        let key_bytes = codec::decode(recipient_key.trim())?;
        let recipient = KemPublicKey::from_bytes(&key_bytes)?;

        tracing::debug!("sealing {} variables for recipient", secrets.len());
        let token = exchange::seal_for(secrets, &recipient)?;
        Ok(token.to_line()?)
    }

    /// Open a received token with this machine's device key
    ///
    /// Fails without revealing any partial plaintext if the token cannot be
    /// decrypted or authenticated.
    pub fn open_with_device_key(&self, token_line: &str) -> Result<SecretSet> {
        let token = ExchangeToken::from_line(token_line)?;
        let pair = self.keys.get_or_create()?;

        let secrets = exchange::open(&token, pair.keypair())?;
        tracing::debug!("opened a token carrying {} variables", secrets.len());
        Ok(secrets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envault_core::Error as CoreError;
    use envault_storage::MemoryKeyStore;

    use crate::error::Error;

    fn sample_secrets() -> SecretSet {
        let mut set = SecretSet::new();
        set.insert("API_KEY", "secret123");
        set.insert("DATABASE_URL", "postgres://localhost/dev");
        set
    }

    #[test]
    fn test_give_receive_round_trip() {
        let recipient = EnvaultClient::with_store(MemoryKeyStore::new());
        let recipient_key = recipient.public_key().unwrap();

        let sender = EnvaultClient::with_store(MemoryKeyStore::new());
        let token = sender.seal_for(&sample_secrets(), &recipient_key).unwrap();

        let recovered = recipient.open_with_device_key(&token).unwrap();
        assert_eq!(recovered, sample_secrets());
    }

    #[test]
    fn test_sender_needs_no_device_key_of_its_own() {
        let recipient = EnvaultClient::with_store(MemoryKeyStore::new());
        let recipient_key = recipient.public_key().unwrap();

        let sender = EnvaultClient::with_store(MemoryKeyStore::new());
        sender.seal_for(&sample_secrets(), &recipient_key).unwrap();

        // Sealing never forced generation of the sender's device key
        assert!(sender.keys.store().load().unwrap().is_none());
    }

    #[test]
    fn test_wrong_device_key_is_rejected() {
        let intended = EnvaultClient::with_store(MemoryKeyStore::new());
        let recipient_key = intended.public_key().unwrap();

        let sender = EnvaultClient::with_store(MemoryKeyStore::new());
        let token = sender.seal_for(&sample_secrets(), &recipient_key).unwrap();

        let interloper = EnvaultClient::with_store(MemoryKeyStore::new());
        let result = interloper.open_with_device_key(&token);

        match result {
            Err(e) => assert!(e.is_rejected_token()),
            Ok(_) => panic!("token opened with the wrong device key"),
        }
    }

    #[test]
    fn test_malformed_recipient_key_is_rejected() {
        let sender = EnvaultClient::with_store(MemoryKeyStore::new());

        let result = sender.seal_for(&sample_secrets(), "not a key");
        assert!(matches!(result, Err(Error::Crypto(CoreError::Decode(_)))));

        // Right encoding, wrong structure
        let short = codec::encode(&[0u8; 16]);
        let result = sender.seal_for(&sample_secrets(), &short);
        assert!(matches!(
            result,
            Err(Error::Crypto(CoreError::InvalidKeyLength { .. }))
        ));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let client = EnvaultClient::with_store(MemoryKeyStore::new());

        let result = client.open_with_device_key("pasted the wrong thing");
        match result {
            Err(e) => assert!(e.is_rejected_token()),
            Ok(_) => panic!("garbage token opened"),
        }
    }

    #[test]
    fn test_public_key_is_stable_across_calls() {
        let client = EnvaultClient::with_store(MemoryKeyStore::new());

        let first = client.public_key().unwrap();
        let second = client.public_key().unwrap();
        assert_eq!(first, second);
    }
}
