//! Envault Core - secure exchange primitives
//!
//! This crate provides the cryptographic core for envault:
//! - Kyber-768 key encapsulation (post-quantum KEM)
//! - ChaCha20-Poly1305 authenticated envelope encryption
//! - Base-58 codec for everything that crosses the human-readable boundary
//! - The exchange token sealed for a single recipient

pub mod codec;
pub mod crypto;
pub mod error;
pub mod exchange;
pub mod secrets;

pub use error::{Error, Result};
pub use exchange::ExchangeToken;
pub use secrets::SecretSet;
