//! The secret set: the plaintext payload of an exchange
//!
//! An ordered collection of unique `(key, value)` pairs. Its canonical byte
//! form is a single JSON object in insertion order; that byte form is what
//! the envelope seals, and round-trip equality through seal/open is the
//! core correctness invariant of the exchange.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Ordered set of named secrets, keys unique
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecretSet {
    entries: Vec<(String, String)>,
}

impl SecretSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, replacing the value in place if the key exists
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical byte form: a single JSON object in insertion order
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse the canonical byte form back into a set
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl FromIterator<(String, String)> for SecretSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

impl Serialize for SecretSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SecretSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SecretSetVisitor;

        impl<'de> Visitor<'de> for SecretSetVisitor {
            type Value = SecretSet;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object of string values")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut set = SecretSet::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    set.insert(key, value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(SecretSetVisitor)
    }
}
