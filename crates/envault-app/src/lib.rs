//! Envault App - the composition layer
//!
//! Wires the exchange core to the device key lifecycle: seal a secret set
//! for a recipient's public key, open a received token with this machine's
//! device key.

pub mod client;
pub mod error;

pub use client::EnvaultClient;
pub use error::{Error, Result};
