//! Application error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Crypto error: {0}")]
    Crypto(#[from] envault_core::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] envault_storage::Error),
}

impl Error {
    /// Whether this failure means the token could not be decrypted or
    /// authenticated (as opposed to a local storage problem)
    pub fn is_rejected_token(&self) -> bool {
        matches!(
            self,
            Error::Crypto(envault_core::Error::Authentication)
                | Error::Crypto(envault_core::Error::Decode(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
