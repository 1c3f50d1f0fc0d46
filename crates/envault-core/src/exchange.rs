//! The exchange: seal a secret set for one recipient, open it with the
//! matching key pair
//!
//! The wire token is a single JSON line carrying the base-58 encoded
//! encapsulated-key blob and envelope ciphertext. It is meant to be carried
//! out-of-band (pasted into chat); this layer does nothing to prevent
//! replay. Every call is a fresh, independent cryptographic operation - no
//! retry, no caching.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::crypto::envelope;
use crate::crypto::kem::{EncapsulatedKey, KemKeyPair, KemPublicKey};
use crate::error::{Error, Result};
use crate::secrets::SecretSet;

/// The opaque token handed to the recipient
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeToken {
    /// Base-58 encoded KEM encapsulated-key blob
    pub encrypted_key: String,
    /// Base-58 encoded envelope ciphertext
    pub ciphertext: String,
}

impl ExchangeToken {
    /// Serialize to the single-line wire form
    pub fn to_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse the wire form
    pub fn from_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim()).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Seal a secret set for the holder of `recipient`
pub fn seal_for(secrets: &SecretSet, recipient: &KemPublicKey) -> Result<ExchangeToken> {
    let payload = secrets.to_bytes()?;
    let (shared_secret, encapsulated) = recipient.encapsulate();
    let sealed = envelope::seal(&payload, &shared_secret)?;

    Ok(ExchangeToken {
        encrypted_key: codec::encode(&encapsulated.to_bytes()),
        ciphertext: codec::encode(&sealed),
    })
}

/// Open a token with the recipient's key pair
///
/// Propagates [`Error::Decode`] and [`Error::Authentication`] unchanged;
/// never returns partial plaintext.
pub fn open(token: &ExchangeToken, keypair: &KemKeyPair) -> Result<SecretSet> {
    let encapsulated_bytes = codec::decode(&token.encrypted_key)?;
    let sealed = codec::decode(&token.ciphertext)?;

    let encapsulated = EncapsulatedKey::from_bytes(&encapsulated_bytes)?;
    let shared_secret = keypair.decapsulate(&encapsulated);

    let payload = envelope::open(&sealed, &shared_secret)?;
    SecretSet::from_bytes(&payload)
}
