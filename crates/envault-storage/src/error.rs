//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The key store location is unavailable or unwritable. Not recovered
    /// locally; surfaces to the caller.
    #[error("Key storage unavailable: {0}")]
    Storage(#[from] std::io::Error),

    /// The persisted record is unreadable or unparseable. The lifecycle
    /// manager recovers by deleting and regenerating.
    #[error("Corrupt device key record: {0}")]
    CorruptRecord(String),

    #[error("No per-user configuration directory available")]
    NoConfigDir,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
