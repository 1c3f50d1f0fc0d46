//! Kyber-768 Key Encapsulation
//!
//! The asymmetric half of the exchange: the sender encapsulates against the
//! recipient's public key to obtain a shared secret plus an encapsulated-key
//! blob, and the recipient decapsulates the blob with the matching secret
//! key to recover the same secret. Kyber-768 sits at the ML-KEM-768
//! security level.
//!
//! Decapsulating with a mismatched secret key does not fail: the KEM's
//! implicit rejection returns a different, indistinguishable-from-random
//! secret, and the envelope layer turns that into an authentication error.

use pqcrypto_kyber::kyber768;
use pqcrypto_traits::kem::{Ciphertext as _, PublicKey as _, SecretKey as _, SharedSecret as _};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Size of a Kyber-768 public key
pub const KEM_PUBLIC_KEY_SIZE: usize = 1184;
/// Size of a Kyber-768 secret key
pub const KEM_SECRET_KEY_SIZE: usize = 2400;
/// Size of a Kyber-768 encapsulated-key blob
pub const KEM_ENCAPSULATED_KEY_SIZE: usize = 1088;
/// Size of the KEM shared secret
pub const SHARED_SECRET_SIZE: usize = 32;

/// Kyber-768 key pair
pub struct KemKeyPair {
    /// Public key for encapsulation
    public_key: kyber768::PublicKey,
    /// Secret key for decapsulation
    secret_key: kyber768::SecretKey,
}

impl Clone for KemKeyPair {
    fn clone(&self) -> Self {
        Self {
            public_key: kyber768::PublicKey::from_bytes(self.public_key.as_bytes())
                .expect("Cloning valid public key should not fail"),
            secret_key: kyber768::SecretKey::from_bytes(self.secret_key.as_bytes())
                .expect("Cloning valid secret key should not fail"),
        }
    }
}

impl Drop for KemKeyPair {
    fn drop(&mut self) {
        // The pqcrypto secret key type does not implement Zeroize, so wipe
        // the extracted bytes and overwrite the field with a zeroed key.
        let mut secret_bytes = self.secret_key.as_bytes().to_vec();
        secret_bytes.zeroize();
        let zeroed = vec![0u8; KEM_SECRET_KEY_SIZE];
        if let Ok(zeroed_key) = kyber768::SecretKey::from_bytes(&zeroed) {
            self.secret_key = zeroed_key;
        }
    }
}

impl KemKeyPair {
    /// Generate a new Kyber-768 key pair from the OS RNG
    pub fn generate() -> Self {
        let (public_key, secret_key) = kyber768::keypair();
        Self {
            public_key,
            secret_key,
        }
    }

    /// Create from raw bytes
    pub fn from_bytes(public_bytes: &[u8], secret_bytes: &[u8]) -> Result<Self> {
        let public_key =
            kyber768::PublicKey::from_bytes(public_bytes).map_err(|_| Error::InvalidKeyLength {
                expected: KEM_PUBLIC_KEY_SIZE,
                actual: public_bytes.len(),
            })?;

        let secret_key =
            kyber768::SecretKey::from_bytes(secret_bytes).map_err(|_| Error::InvalidKeyLength {
                expected: KEM_SECRET_KEY_SIZE,
                actual: secret_bytes.len(),
            })?;

        Ok(Self {
            public_key,
            secret_key,
        })
    }

    /// Get the public key
    pub fn public_key(&self) -> KemPublicKey {
        KemPublicKey {
            inner: self.public_key.clone(),
        }
    }

    /// Decapsulate an encapsulated-key blob to recover the shared secret
    pub fn decapsulate(&self, encapsulated: &EncapsulatedKey) -> SharedSecret {
        let shared_secret = kyber768::decapsulate(&encapsulated.inner, &self.secret_key);
        let mut secret = [0u8; SHARED_SECRET_SIZE];
        secret.copy_from_slice(shared_secret.as_bytes());
        SharedSecret { secret }
    }

    /// Export public key bytes
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.as_bytes().to_vec()
    }

    /// Export secret key bytes
    pub fn secret_key_bytes(&self) -> Vec<u8> {
        self.secret_key.as_bytes().to_vec()
    }
}

/// Kyber-768 public key
#[derive(Clone)]
pub struct KemPublicKey {
    inner: kyber768::PublicKey,
}

impl std::fmt::Debug for KemPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KemPublicKey")
            .field("size", &KEM_PUBLIC_KEY_SIZE)
            .finish()
    }
}

impl KemPublicKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let inner = kyber768::PublicKey::from_bytes(bytes).map_err(|_| Error::InvalidKeyLength {
            expected: KEM_PUBLIC_KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self { inner })
    }

    /// Encapsulate against this key, producing a fresh shared secret and
    /// the blob the recipient needs to recover it
    pub fn encapsulate(&self) -> (SharedSecret, EncapsulatedKey) {
        let (shared_secret, encapsulated) = kyber768::encapsulate(&self.inner);
        let mut secret = [0u8; SHARED_SECRET_SIZE];
        secret.copy_from_slice(shared_secret.as_bytes());
        (
            SharedSecret { secret },
            EncapsulatedKey {
                inner: encapsulated,
            },
        )
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.as_bytes().to_vec()
    }
}

/// Kyber-768 encapsulated-key blob
#[derive(Clone)]
pub struct EncapsulatedKey {
    inner: kyber768::Ciphertext,
}

impl std::fmt::Debug for EncapsulatedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncapsulatedKey")
            .field("size", &KEM_ENCAPSULATED_KEY_SIZE)
            .finish()
    }
}

impl EncapsulatedKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let inner = kyber768::Ciphertext::from_bytes(bytes).map_err(|_| Error::InvalidKeyLength {
            expected: KEM_ENCAPSULATED_KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self { inner })
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.as_bytes().to_vec()
    }
}

/// KEM-derived shared secret
///
/// Fixed-length key material, zeroized on drop, never transmitted directly.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SharedSecret {
    secret: [u8; SHARED_SECRET_SIZE],
}

impl SharedSecret {
    /// Wrap raw key material, rejecting anything but the exact KEM output
    /// length
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let secret: [u8; SHARED_SECRET_SIZE] =
            bytes.try_into().map_err(|_| Error::InvalidKeyLength {
                expected: SHARED_SECRET_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self { secret })
    }

    /// Get the shared secret bytes
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.secret
    }
}
