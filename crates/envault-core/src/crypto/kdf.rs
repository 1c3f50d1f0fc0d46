//! Envelope key derivation
//!
//! The raw KEM output is never used as a cipher key directly; the envelope
//! key is derived through HKDF-SHA256 with a fixed domain-separation string
//! so the KEM and AEAD layers stay decoupled.

use hkdf::Hkdf;
use sha2::Sha256;

use super::kem::SharedSecret;

/// Domain separation string for the envelope key
const ENVELOPE_INFO: &[u8] = b"envault_v1_envelope";

/// Size of the derived envelope key in bytes
pub const KEY_SIZE: usize = 32;

/// Derive the ChaCha20-Poly1305 envelope key from a KEM shared secret
pub fn derive_envelope_key(shared_secret: &SharedSecret) -> [u8; KEY_SIZE] {
    let hkdf = Hkdf::<Sha256>::new(None, shared_secret.as_bytes());
    let mut key = [0u8; KEY_SIZE];
    hkdf.expand(ENVELOPE_INFO, &mut key)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    key
}
