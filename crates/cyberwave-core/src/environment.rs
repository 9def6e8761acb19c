use serde::{Deserialize, Serialize};

pub const PRODUCTION_BACKEND_URL: &str = "https://api.cyberwave.com";
pub const PRODUCTION_FRONTEND_URL: &str = "https://app.cyberwave.com";
pub const STAGING_BACKEND_URL: &str = "https://api.staging.cyberwave.com";
pub const STAGING_FRONTEND_URL: &str = "https://app.staging.cyberwave.com";
pub const LOCAL_BACKEND_URL: &str = "http://localhost:8000";
pub const LOCAL_FRONTEND_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentName {
    #[default]
    Production,
    Staging,
    Local,
}

impl EnvironmentName {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "local" | "dev" => Some(Self::Local),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend/frontend URL pair currently in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: EnvironmentName,
    pub backend_url: String,
    pub frontend_url: String,
}

/// Inputs to environment resolution, assembled by the caller so resolution
/// itself stays deterministic and testable.
#[derive(Debug, Default, Clone)]
pub struct EnvironmentOverrides {
    /// Explicit CLI flag (`--backend-url`). Highest precedence.
    pub explicit_backend_url: Option<String>,
    /// `CYBERWAVE_BACKEND_URL`.
    pub env_backend_url: Option<String>,
    /// `CYBERWAVE_ENVIRONMENT`.
    pub env_environment: Option<String>,
    /// Environment name from persisted config.
    pub config_environment: Option<String>,
    /// Backend URL from persisted config.
    pub config_backend_url: Option<String>,
    /// Frontend URL from persisted config.
    pub config_frontend_url: Option<String>,
}

impl Environment {
    pub fn named(name: EnvironmentName) -> Self {
        let (backend_url, frontend_url) = match name {
            EnvironmentName::Production => (PRODUCTION_BACKEND_URL, PRODUCTION_FRONTEND_URL),
            EnvironmentName::Staging => (STAGING_BACKEND_URL, STAGING_FRONTEND_URL),
            EnvironmentName::Local => (LOCAL_BACKEND_URL, LOCAL_FRONTEND_URL),
        };
        Self {
            name,
            backend_url: backend_url.to_string(),
            frontend_url: frontend_url.to_string(),
        }
    }

    /// Resolve the effective environment.
    ///
    /// Precedence for the backend URL: explicit flag > `CYBERWAVE_BACKEND_URL`
    /// > persisted config > built-in default for the selected environment
    /// name. The name itself resolves `CYBERWAVE_ENVIRONMENT` > persisted
    /// config > production. Unknown names fall back to production rather
    /// than failing the invocation.
    pub fn resolve(overrides: &EnvironmentOverrides) -> Self {
        let name = overrides
            .env_environment
            .as_deref()
            .and_then(EnvironmentName::parse)
            .or_else(|| {
                overrides
                    .config_environment
                    .as_deref()
                    .and_then(EnvironmentName::parse)
            })
            .unwrap_or_default();

        let mut environment = Self::named(name);

        if let Some(frontend_url) = non_empty(overrides.config_frontend_url.as_deref()) {
            environment.frontend_url = frontend_url;
        }
        let backend_override = non_empty(overrides.explicit_backend_url.as_deref())
            .or_else(|| non_empty(overrides.env_backend_url.as_deref()))
            .or_else(|| non_empty(overrides.config_backend_url.as_deref()));
        if let Some(backend_url) = backend_override {
            environment.backend_url = backend_url;
        }

        environment.backend_url = environment.backend_url.trim_end_matches('/').to_string();
        environment.frontend_url = environment.frontend_url.trim_end_matches('/').to_string();
        environment
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_production() {
        let environment = Environment::resolve(&EnvironmentOverrides::default());
        assert_eq!(environment.name, EnvironmentName::Production);
        assert_eq!(environment.backend_url, PRODUCTION_BACKEND_URL);
        assert_eq!(environment.frontend_url, PRODUCTION_FRONTEND_URL);
    }

    #[test]
    fn env_var_name_beats_config_name() {
        let overrides = EnvironmentOverrides {
            env_environment: Some("staging".to_string()),
            config_environment: Some("local".to_string()),
            ..Default::default()
        };
        let environment = Environment::resolve(&overrides);
        assert_eq!(environment.name, EnvironmentName::Staging);
        assert_eq!(environment.backend_url, STAGING_BACKEND_URL);
    }

    #[test]
    fn explicit_flag_beats_everything() {
        let overrides = EnvironmentOverrides {
            explicit_backend_url: Some("http://flag:9000/".to_string()),
            env_backend_url: Some("http://env:9001".to_string()),
            config_backend_url: Some("http://config:9002".to_string()),
            ..Default::default()
        };
        let environment = Environment::resolve(&overrides);
        assert_eq!(environment.backend_url, "http://flag:9000");
    }

    #[test]
    fn env_var_url_beats_persisted_config() {
        let overrides = EnvironmentOverrides {
            env_backend_url: Some("http://env:9001".to_string()),
            config_backend_url: Some("http://config:9002".to_string()),
            ..Default::default()
        };
        let environment = Environment::resolve(&overrides);
        assert_eq!(environment.backend_url, "http://env:9001");
    }

    #[test]
    fn unknown_environment_name_falls_back_to_production() {
        let overrides = EnvironmentOverrides {
            env_environment: Some("mystery".to_string()),
            ..Default::default()
        };
        let environment = Environment::resolve(&overrides);
        assert_eq!(environment.name, EnvironmentName::Production);
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let overrides = EnvironmentOverrides {
            explicit_backend_url: Some("   ".to_string()),
            ..Default::default()
        };
        let environment = Environment::resolve(&overrides);
        assert_eq!(environment.backend_url, PRODUCTION_BACKEND_URL);
    }
}
