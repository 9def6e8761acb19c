use serde::{Deserialize, Serialize};

/// Persisted CLI configuration (`config.json` in the config directory).
///
/// Everything is optional; absent keys fall back to env vars and built-in
/// defaults during environment resolution.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct CliConfig {
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default)]
    pub frontend_url: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}
