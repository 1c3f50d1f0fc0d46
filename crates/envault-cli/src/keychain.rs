//! Platform credential store access
//!
//! Wraps `keyring::Entry` with a per-service key index, since the keyring
//! crate cannot enumerate entries. The index is itself a keychain entry
//! holding the known keys, newline-separated, in insertion order.

use anyhow::{Context, Result};
use keyring::Entry;

use envault_core::SecretSet;

/// Reserved account name for the key index
const INDEX_ACCOUNT: &str = "__envault_index__";

pub struct KeychainManager {
    service_name: String,
}

impl KeychainManager {
    pub fn new(service_name: String) -> Self {
        Self { service_name }
    }

    pub fn set_var(&self, key: &str, value: &str) -> Result<()> {
        let entry = Entry::new(&self.service_name, key)?;
        entry
            .set_password(value)
            .with_context(|| format!("Failed to set {} in keychain", key))?;

        self.add_to_index(key)?;
        Ok(())
    }

    pub fn get_var(&self, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(&self.service_name, key)?;
        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read from keychain"),
        }
    }

    pub fn delete_var(&self, key: &str) -> Result<bool> {
        let entry = Entry::new(&self.service_name, key)?;
        let deleted = match entry.delete_credential() {
            Ok(()) => true,
            Err(keyring::Error::NoEntry) => false,
            Err(e) => return Err(e).context("Failed to delete from keychain"),
        };

        if deleted {
            let keys: Vec<String> = self
                .read_index()?
                .into_iter()
                .filter(|k| k != key)
                .collect();
            self.write_index(&keys)?;
        }

        Ok(deleted)
    }

    /// All stored variables for this service, in index order
    pub fn list_vars(&self) -> Result<SecretSet> {
        let mut vars = SecretSet::new();
        for key in self.read_index()? {
            if let Some(value) = self.get_var(&key)? {
                vars.insert(key, value);
            }
        }
        Ok(vars)
    }

    pub fn set_vars(&self, vars: &SecretSet) -> Result<()> {
        for (key, value) in vars.iter() {
            self.set_var(key, value)?;
        }
        Ok(())
    }

    /// Delete every indexed variable plus the index itself, returning how
    /// many variables were removed
    pub fn clear_all(&self) -> Result<usize> {
        let keys = self.read_index()?;
        let mut removed = 0;

        for key in &keys {
            let entry = Entry::new(&self.service_name, key)?;
            match entry.delete_credential() {
                Ok(()) => removed += 1,
                Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(e).context("Failed to delete from keychain"),
            }
        }

        let index = Entry::new(&self.service_name, INDEX_ACCOUNT)?;
        match index.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(e).context("Failed to delete keychain index"),
        }

        Ok(removed)
    }

    fn read_index(&self) -> Result<Vec<String>> {
        let entry = Entry::new(&self.service_name, INDEX_ACCOUNT)?;
        match entry.get_password() {
            Ok(index) => Ok(index
                .lines()
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect()),
            Err(keyring::Error::NoEntry) => Ok(Vec::new()),
            Err(e) => Err(e).context("Failed to read keychain index"),
        }
    }

    fn write_index(&self, keys: &[String]) -> Result<()> {
        let entry = Entry::new(&self.service_name, INDEX_ACCOUNT)?;
        if keys.is_empty() {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => return Ok(()),
                Err(e) => return Err(e).context("Failed to clear keychain index"),
            }
        }

        entry
            .set_password(&keys.join("\n"))
            .context("Failed to update keychain index")?;
        Ok(())
    }

    fn add_to_index(&self, key: &str) -> Result<()> {
        let mut keys = self.read_index()?;
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
            self.write_index(&keys)?;
        }
        Ok(())
    }
}
