use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cyberwave_core::{
    CONFIG_DIR_ENV, CONFIG_FILE, CREDENTIALS_FILE, IDENTITY_FILE, PENDING_FILE, SYSTEM_CONFIG_DIR,
    USER_CONFIG_DIR,
};

/// Resolved location of everything the CLI persists.
///
/// Resolution order: `CYBERWAVE_CONFIG_DIR` env override, then the
/// system-wide directory when writable, then the per-user directory.
#[derive(Debug, Clone)]
pub(crate) struct Paths {
    pub config_dir: PathBuf,
}

impl Paths {
    pub(crate) fn resolve() -> anyhow::Result<Self> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Ok(Self {
                    config_dir: PathBuf::from(dir),
                });
            }
        }

        let system_dir = Path::new(SYSTEM_CONFIG_DIR);
        if dir_is_writable(system_dir) {
            return Ok(Self {
                config_dir: system_dir.to_path_buf(),
            });
        }

        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("HOME is not set"))?;
        Ok(Self {
            config_dir: Path::new(&home).join(USER_CONFIG_DIR),
        })
    }

    pub(crate) fn identity_file(&self) -> PathBuf {
        self.config_dir.join(IDENTITY_FILE)
    }

    pub(crate) fn credentials_file(&self) -> PathBuf {
        self.config_dir.join(CREDENTIALS_FILE)
    }

    pub(crate) fn pending_file(&self) -> PathBuf {
        self.config_dir.join(PENDING_FILE)
    }

    pub(crate) fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

fn dir_is_writable(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    let probe = dir.join(format!(".writable.{}", std::process::id()));
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
    {
        Ok(_) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

/// Replace `path` atomically so a concurrent reader never observes a
/// half-written file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    atomic_replace(path, contents, false)
}

/// Like [`write_atomic`] but the file ends up owner-only.
pub(crate) fn write_secret_atomic(path: &Path, contents: &str) -> io::Result<()> {
    atomic_replace(path, contents, true)
}

fn atomic_replace(path: &Path, contents: &str, owner_only: bool) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other("path has no parent directory"))?;
    fs::create_dir_all(parent)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file");
    let tmp = parent.join(format!(".{file_name}.{}.tmp", std::process::id()));
    fs::write(&tmp, contents)?;
    if owner_only {
        if let Err(err) = set_owner_only(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
    }
    fs::rename(&tmp, path)
}

#[cfg(unix)]
pub(crate) fn set_owner_only(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
pub(crate) fn set_owner_only(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn env_override_wins() {
        let dir = tempdir().expect("tempdir");
        std::env::set_var(CONFIG_DIR_ENV, dir.path());
        let paths = Paths::resolve().expect("resolve");
        assert_eq!(paths.config_dir, dir.path());
        std::env::remove_var(CONFIG_DIR_ENV);
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        write_atomic(&path, "{\"a\":1}").expect("first write");
        write_atomic(&path, "{\"a\":2}").expect("second write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "{\"a\":2}");
    }

    #[cfg(unix)]
    #[test]
    fn secret_write_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        write_secret_atomic(&path, "{}").expect("write");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
