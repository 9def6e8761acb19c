/// Overrides the config directory resolution entirely.
pub const CONFIG_DIR_ENV: &str = "CYBERWAVE_CONFIG_DIR";
/// Overrides the backend URL regardless of the selected environment.
pub const BACKEND_URL_ENV: &str = "CYBERWAVE_BACKEND_URL";
/// Selects a named environment (production, staging, local).
pub const ENVIRONMENT_ENV: &str = "CYBERWAVE_ENVIRONMENT";
/// When set, skips the platform keystore and keeps credentials only in the
/// fallback file. Meant for headless hosts without a keychain daemon.
pub const NO_KEYRING_ENV: &str = "CYBERWAVE_NO_KEYRING";

/// System-wide config location, preferred when writable so the CLI and an
/// installed edge-core service share one identity and credential set.
pub const SYSTEM_CONFIG_DIR: &str = "/etc/cyberwave";
/// Per-user fallback, relative to the home directory.
pub const USER_CONFIG_DIR: &str = ".cyberwave";

pub const IDENTITY_FILE: &str = "identity.json";
pub const CREDENTIALS_FILE: &str = "credentials.json";
pub const PENDING_FILE: &str = "pending.jsonl";
pub const CONFIG_FILE: &str = "config.json";

/// Health probes must stay short so every CLI command remains responsive
/// when the backend is unreachable.
pub const PROBE_TIMEOUT_SECS: u64 = 2;

/// Bounded timeout applied to every one-shot backend call.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Consecutive transport errors tolerated by the device-flow poll loop
/// before it gives up.
pub const MAX_POLL_TRANSPORT_ERRORS: u32 = 2;
