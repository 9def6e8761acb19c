use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};

use cyberwave_core::{Credentials, Error, NO_KEYRING_ENV};
use cyberwave_keystore::{default_store, Lookup, SecretStore, UnavailableStore};

use crate::modules::system::{write_secret_atomic, Paths};

/// Keychain service name shared by every CLI invocation on this machine.
const KEYSTORE_SERVICE: &str = "cyberwave-cli";
const CREDENTIALS_KEY: &str = "credentials";

/// Sole owner of persisted credentials.
///
/// Two backing locations are kept in step: the platform secret store and an
/// owner-only fallback file. Loads fold the chain `keystore -> fallback`
/// deterministically; saves write both so a later keystore failure does not
/// orphan the user.
pub(crate) struct CredentialVault {
    store: Box<dyn SecretStore>,
    fallback_path: PathBuf,
}

impl CredentialVault {
    pub(crate) fn new(store: Box<dyn SecretStore>, fallback_path: PathBuf) -> Self {
        Self {
            store,
            fallback_path,
        }
    }

    pub(crate) fn open(paths: &Paths) -> Self {
        let store: Box<dyn SecretStore> = if std::env::var_os(NO_KEYRING_ENV).is_some() {
            Box::new(UnavailableStore)
        } else {
            default_store(KEYSTORE_SERVICE)
        };
        Self::new(store, paths.credentials_file())
    }

    /// Load credentials, treating every invalid or unreadable value as
    /// absent. Callers never fail because a store is broken.
    pub(crate) fn load(&self) -> Option<Credentials> {
        match self.store.get(CREDENTIALS_KEY) {
            Lookup::Found(raw) => {
                if let Some(credentials) = parse_credentials(&raw) {
                    return Some(credentials);
                }
                debug!("keystore credentials failed validation; trying fallback file");
            }
            Lookup::NotFound => {
                debug!("no credentials in platform keystore; trying fallback file");
            }
            Lookup::Unavailable => {
                debug!("platform keystore unavailable; trying fallback file");
            }
        }
        self.load_fallback()
    }

    /// Persist credentials to both locations. Each write is best-effort;
    /// only the loss of both is an error.
    pub(crate) fn save(&self, credentials: &Credentials) -> Result<(), Error> {
        let raw = serde_json::to_string_pretty(credentials).map_err(Error::storage)?;

        let store_result = self.store.set(CREDENTIALS_KEY, &raw);
        if let Err(err) = &store_result {
            warn!(error = %err, "platform keystore write failed");
        }

        let file_result = write_secret_atomic(&self.fallback_path, &raw);
        if let Err(err) = &file_result {
            warn!(error = %err, "credentials fallback file write failed");
        }

        if store_result.is_err() && file_result.is_err() {
            return Err(Error::storage(
                "could not persist credentials to the keystore or the fallback file",
            ));
        }
        Ok(())
    }

    /// Remove credentials from both locations. Removing nothing is fine.
    pub(crate) fn clear(&self) -> Result<(), Error> {
        let store_result = self.store.delete(CREDENTIALS_KEY);
        if let Err(err) = &store_result {
            warn!(error = %err, "platform keystore delete failed");
        }

        let file_result = match fs::remove_file(&self.fallback_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        };
        if let Err(err) = &file_result {
            warn!(error = %err, "credentials fallback file delete failed");
        }

        if store_result.is_err() || file_result.is_err() {
            return Err(Error::storage("could not fully clear stored credentials"));
        }
        Ok(())
    }

    fn load_fallback(&self) -> Option<Credentials> {
        let raw = fs::read_to_string(&self.fallback_path).ok()?;
        parse_credentials(&raw)
    }
}

/// A credential value is either wholly usable or treated as absent; a record
/// with an empty access token is never surfaced.
fn parse_credentials(raw: &str) -> Option<Credentials> {
    let credentials: Credentials = serde_json::from_str(raw).ok()?;
    if credentials.access_token.is_empty() {
        return None;
    }
    Some(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use cyberwave_keystore::{MemoryStore, UnavailableStore};
    use tempfile::tempdir;

    fn make_credentials() -> Credentials {
        Credentials {
            access_token: "access-1".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: Utc::now() + ChronoDuration::seconds(3600),
            email: Some("edge@example.com".to_string()),
            workspace_id: None,
            project_id: None,
        }
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let vault = CredentialVault::new(
            Box::new(MemoryStore::new()),
            dir.path().join("credentials.json"),
        );
        let credentials = make_credentials();
        vault.save(&credentials).expect("save");
        assert_eq!(vault.load(), Some(credentials));
    }

    #[test]
    fn load_falls_back_to_file_when_keystore_unavailable() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        let credentials = make_credentials();

        // Seed both locations, then read through a vault whose keystore is
        // permanently unavailable.
        CredentialVault::new(Box::new(MemoryStore::new()), path.clone())
            .save(&credentials)
            .expect("seed");
        let vault = CredentialVault::new(Box::new(UnavailableStore), path);
        assert_eq!(vault.load(), Some(credentials));
    }

    #[test]
    fn save_succeeds_when_only_the_file_write_works() {
        let dir = tempdir().expect("tempdir");
        let vault = CredentialVault::new(
            Box::new(UnavailableStore),
            dir.path().join("credentials.json"),
        );
        let credentials = make_credentials();
        vault.save(&credentials).expect("save");
        assert_eq!(vault.load(), Some(credentials));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let vault = CredentialVault::new(
            Box::new(MemoryStore::new()),
            dir.path().join("credentials.json"),
        );
        vault.save(&make_credentials()).expect("save");
        vault.clear().expect("first clear");
        vault.clear().expect("second clear");
        assert_eq!(vault.load(), None);
    }

    #[test]
    fn empty_access_token_is_treated_as_absent() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        let mut credentials = make_credentials();
        credentials.access_token = String::new();
        std::fs::write(
            &path,
            serde_json::to_string(&credentials).expect("serialize"),
        )
        .expect("write");
        let vault = CredentialVault::new(Box::new(MemoryStore::new()), path);
        assert_eq!(vault.load(), None);
    }

    #[test]
    fn garbage_fallback_file_is_treated_as_absent() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "definitely not json").expect("write");
        let vault = CredentialVault::new(Box::new(MemoryStore::new()), path);
        assert_eq!(vault.load(), None);
    }
}
