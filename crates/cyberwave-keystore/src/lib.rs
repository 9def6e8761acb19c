//! Platform secret-store abstraction.
//!
//! Lookups return a tagged [`Lookup`] instead of an error so callers can fold
//! a fallback chain deterministically: `Found` short-circuits, `NotFound`
//! means the store works but has no value, and `Unavailable` means the store
//! itself could not be consulted (no keychain daemon, locked session,
//! unsupported platform).

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum KeystoreError {
    #[error("platform keystore unavailable")]
    Unavailable,
    #[error("keystore failure: {message}")]
    Internal { message: String },
}

/// Outcome of a secret lookup.
#[derive(Debug)]
pub enum Lookup {
    Found(String),
    NotFound,
    Unavailable,
}

pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> Lookup;
    fn set(&self, key: &str, value: &str) -> Result<(), KeystoreError>;
    /// Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), KeystoreError>;
}

/// Secret store backed by the OS keychain via the `keyring` crate.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, KeystoreError> {
        keyring::Entry::new(&self.service, key).map_err(|err| KeystoreError::Internal {
            message: err.to_string(),
        })
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, key: &str) -> Lookup {
        let entry = match self.entry(key) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(key, error = %err, "keyring entry construction failed");
                return Lookup::Unavailable;
            }
        };
        match entry.get_password() {
            Ok(value) => Lookup::Found(value),
            Err(keyring::Error::NoEntry) => Lookup::NotFound,
            Err(err) => {
                debug!(key, error = %err, "keyring read failed");
                Lookup::Unavailable
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeystoreError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|err| KeystoreError::Internal {
                message: err.to_string(),
            })
    }

    fn delete(&self, key: &str) -> Result<(), KeystoreError> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(KeystoreError::Internal {
                message: err.to_string(),
            }),
        }
    }
}

/// In-memory store used by tests and as an explicit opt-out of the platform
/// keychain.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, key: &str) -> Lookup {
        match self.entries.lock() {
            Ok(entries) => match entries.get(key) {
                Some(value) => Lookup::Found(value.clone()),
                None => Lookup::NotFound,
            },
            Err(_) => Lookup::Unavailable,
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KeystoreError> {
        let mut entries = self.entries.lock().map_err(|_| KeystoreError::Internal {
            message: "store poisoned".to_string(),
        })?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KeystoreError> {
        let mut entries = self.entries.lock().map_err(|_| KeystoreError::Internal {
            message: "store poisoned".to_string(),
        })?;
        entries.remove(key);
        Ok(())
    }
}

/// Store whose reads always report `Unavailable`, standing in for a locked or
/// missing platform keychain in tests.
#[derive(Default)]
pub struct UnavailableStore;

impl SecretStore for UnavailableStore {
    fn get(&self, _key: &str) -> Lookup {
        Lookup::Unavailable
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), KeystoreError> {
        Err(KeystoreError::Unavailable)
    }

    fn delete(&self, _key: &str) -> Result<(), KeystoreError> {
        // Nothing could have been stored, so there is nothing to remove.
        Ok(())
    }
}

pub fn default_store(service: &str) -> Box<dyn SecretStore> {
    Box::new(KeyringStore::new(service))
}
