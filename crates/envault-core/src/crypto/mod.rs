//! Cryptographic primitives for envault
//!
//! This module provides:
//! - `kem`: Kyber-768 key encapsulation
//! - `envelope`: authenticated envelope encryption (ChaCha20-Poly1305)
//! - `kdf`: envelope key derivation from the KEM shared secret

pub mod envelope;
pub mod kdf;
pub mod kem;

pub use envelope::{open, seal};
pub use kem::{EncapsulatedKey, KemKeyPair, KemPublicKey, SharedSecret};
