//! Authenticated envelope encryption
//!
//! ChaCha20-Poly1305 over the serialized secret set, keyed by the KEM
//! shared secret (via HKDF). Every seal uses a fresh random nonce, so the
//! same plaintext sealed twice yields different ciphertexts. Any tampering,
//! truncation, or wrong-key decryption fails hard; no partial plaintext is
//! ever returned.
//!
//! Wire layout: nonce (12) || ciphertext || tag (16)

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

use super::kdf;
use super::kem::SharedSecret;
use crate::error::{Error, Result};

/// Size of the nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Seal a payload under a KEM shared secret
pub fn seal(plaintext: &[u8], shared_secret: &SharedSecret) -> Result<Vec<u8>> {
    let key = kdf::derive_envelope_key(shared_secret);
    let cipher =
        ChaCha20Poly1305::new_from_slice(&key).map_err(|e| Error::Encryption(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| Error::Encryption(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Open a sealed payload, verifying its integrity
///
/// Fails with [`Error::Authentication`] if the envelope was tampered with,
/// truncated, or sealed under a different shared secret.
pub fn open(sealed: &[u8], shared_secret: &SharedSecret) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::Authentication);
    }

    let key = kdf::derive_envelope_key(shared_secret);
    let cipher =
        ChaCha20Poly1305::new_from_slice(&key).map_err(|e| Error::Encryption(e.to_string()))?;

    let nonce = Nonce::from_slice(&sealed[..NONCE_SIZE]);
    let ciphertext = &sealed[NONCE_SIZE..];

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| Error::Authentication)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn test_secret(fill: u8) -> SharedSecret {
        SharedSecret::from_bytes(&[fill; 32]).unwrap()
    }

    #[test]
    fn test_seal_open_round_trip() {
        let secret = test_secret(1);
        let plaintext = b"API_KEY=secret123";

        let sealed = seal(plaintext, &secret).unwrap();
        let opened = open(&sealed, &secret).unwrap();

        assert_eq!(plaintext.as_slice(), opened.as_slice());
    }

    #[test]
    fn test_empty_plaintext_round_trip() {
        let secret = test_secret(2);

        let sealed = seal(b"", &secret).unwrap();
        let opened = open(&sealed, &secret).unwrap();

        assert!(opened.is_empty());
    }

    #[test]
    fn test_large_payload_round_trip() {
        let secret = test_secret(3);
        let mut plaintext = vec![0u8; 32 * 1024];
        rand::thread_rng().fill_bytes(&mut plaintext);

        let sealed = seal(&plaintext, &secret).unwrap();
        let opened = open(&sealed, &secret).unwrap();

        assert_eq!(plaintext, opened);
    }

    #[test]
    fn test_sealing_is_randomized() {
        let secret = test_secret(4);
        let plaintext = b"same plaintext";

        let first = seal(plaintext, &secret).unwrap();
        let second = seal(plaintext, &secret).unwrap();

        assert_ne!(first, second);
        assert_eq!(open(&first, &secret).unwrap(), plaintext);
        assert_eq!(open(&second, &secret).unwrap(), plaintext);
    }

    #[test]
    fn test_wrong_secret_fails() {
        let sealed = seal(b"payload", &test_secret(5)).unwrap();

        let result = open(&sealed, &test_secret(6));
        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_every_bit_flip_is_detected() {
        let secret = test_secret(7);
        let sealed = seal(b"sixteen byte msg", &secret).unwrap();

        for byte in 0..sealed.len() {
            for bit in 0..8 {
                let mut tampered = sealed.clone();
                tampered[byte] ^= 1 << bit;

                let result = open(&tampered, &secret);
                assert!(
                    matches!(result, Err(Error::Authentication)),
                    "bit {} of byte {} survived tampering",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn test_truncation_fails() {
        let secret = test_secret(8);
        let sealed = seal(b"payload", &secret).unwrap();

        for len in 0..sealed.len() {
            let result = open(&sealed[..len], &secret);
            assert!(matches!(result, Err(Error::Authentication)));
        }
    }

    #[test]
    fn test_ciphertext_structure() {
        let secret = test_secret(9);
        let plaintext = b"hello!";

        let sealed = seal(plaintext, &secret).unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
    }
}
