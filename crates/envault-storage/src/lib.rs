//! Envault Storage - device key lifecycle
//!
//! Owns the one long-lived key pair per machine: lazy generation, JSON
//! persistence at a per-user path, and expiry-driven regeneration. The
//! backing store is an injected trait so tests can swap in an in-memory
//! implementation.

pub mod device;
pub mod error;
pub mod keystore;

pub use device::{DeviceKeyManager, DeviceKeyPair, DEVICE_KEY_LIFETIME_MS};
pub use error::{Error, Result};
pub use keystore::{DeviceKeyRecord, FileKeyStore, KeyStore, MemoryKeyStore};
