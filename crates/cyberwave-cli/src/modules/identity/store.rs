use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, warn};

use cyberwave_core::{Error, NodeIdentity};

use crate::modules::system::write_atomic;

/// Reads and writes the durable node identity record.
pub(crate) struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Return the persisted identity, creating it on first access.
    ///
    /// Creation is guarded by an exclusive-create primitive: the full record
    /// is written to a unique temp file and hard-linked into place. When two
    /// CLI processes race, exactly one link succeeds and the loser re-reads
    /// the winner's record, so both converge on the same `node_id`.
    pub(crate) fn get_or_create(&self) -> Result<NodeIdentity, Error> {
        if let Some(identity) = self.read()? {
            return Ok(identity);
        }

        let fresh = new_identity();
        match self.create_exclusive(&fresh) {
            Ok(()) => {
                debug!(node_id = %fresh.node_id, "created node identity");
                Ok(fresh)
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => self
                .read()?
                .ok_or_else(|| Error::storage("identity record vanished after creation race")),
            Err(err) => Err(Error::storage(err)),
        }
    }

    /// Best-effort bump of `last_seen`; storage failures are logged and
    /// swallowed so an unwritable disk never breaks the invocation.
    pub(crate) fn touch_last_seen(&self, identity: &mut NodeIdentity) {
        identity.last_seen = Utc::now();
        let contents = match serde_json::to_string_pretty(identity) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(error = %err, "could not serialize identity for last_seen update");
                return;
            }
        };
        if let Err(err) = write_atomic(&self.path, &contents) {
            warn!(error = %err, "could not persist last_seen update");
        }
    }

    fn read(&self) -> Result<Option<NodeIdentity>, Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::storage(err)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| Error::storage(format!("corrupt identity record: {err}")))
    }

    fn create_exclusive(&self, identity: &NodeIdentity) -> io::Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| io::Error::other("identity path has no parent directory"))?;
        fs::create_dir_all(parent)?;
        let contents = serde_json::to_string_pretty(identity)
            .map_err(|err| io::Error::other(err.to_string()))?;
        // The temp name embeds the candidate node_id, which is unique per
        // racing process.
        let tmp = parent.join(format!(".identity.{}.tmp", identity.node_id));
        fs::write(&tmp, &contents)?;
        let linked = fs::hard_link(&tmp, &self.path);
        let _ = fs::remove_file(&tmp);
        linked
    }
}

fn new_identity() -> NodeIdentity {
    NodeIdentity::new(
        detect_hostname(),
        detect_mac_address(),
        env!("CARGO_PKG_VERSION").to_string(),
    )
}

/// Identity for the current run when the store is unusable; nothing is
/// persisted, which the caller reports as a warning.
pub(crate) fn ephemeral_identity() -> NodeIdentity {
    new_identity()
}

fn detect_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string())
}

#[cfg(target_os = "linux")]
fn detect_mac_address() -> Option<String> {
    let entries = fs::read_dir("/sys/class/net").ok()?;
    for entry in entries.flatten() {
        if entry.file_name() == "lo" {
            continue;
        }
        if let Ok(address) = fs::read_to_string(entry.path().join("address")) {
            let address = address.trim();
            if !address.is_empty() && address != "00:00:00:00:00:00" {
                return Some(address.to_string());
            }
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn detect_mac_address() -> Option<String> {
    None
}
