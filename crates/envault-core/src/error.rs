//! Error types for the exchange core

use thiserror::Error;

/// Core error type for envault cryptographic operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed base-58 encoding: {0}")]
    Decode(String),

    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Authentication failed: token was tampered with or sealed for a different key")]
    Authentication,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for envault core operations
pub type Result<T> = std::result::Result<T, Error>;
