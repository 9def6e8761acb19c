use serde::{Deserialize, Serialize};

use cyberwave_core::Credentials;

/// Server-issued device authorization, alive for one login invocation.
///
/// `device_code` is only ever sent back on the poll request; it is never
/// displayed, logged, or persisted.
#[derive(Clone, Deserialize)]
pub(crate) struct DeviceAuthSession {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub expires_in: i64,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_interval() -> u64 {
    5
}

impl std::fmt::Debug for DeviceAuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceAuthSession")
            .field("device_code", &"<redacted>")
            .field("user_code", &self.user_code)
            .field("verification_url", &self.verification_url)
            .field("expires_in", &self.expires_in)
            .field("interval", &self.interval)
            .finish()
    }
}

#[derive(Serialize)]
pub(crate) struct DeviceInitiateRequest<'a> {
    pub node_id: &'a str,
    pub node_name: &'a str,
    pub hostname: &'a str,
    pub platform: &'a str,
    pub version: &'a str,
}

#[derive(Serialize)]
pub(crate) struct DeviceTokenRequest<'a> {
    pub device_code: &'a str,
    pub node_id: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
    pub node_id: &'a str,
}

/// Successful token payload from the device-token or refresh endpoint.
#[derive(Deserialize)]
pub(crate) struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub user: Option<TokenUser>,
}

#[derive(Deserialize)]
pub(crate) struct TokenUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl TokenGrant {
    pub(crate) fn into_credentials(self) -> Credentials {
        let (email, workspace_id, project_id) = match self.user {
            Some(user) => (user.email, user.workspace_id, user.project_id),
            None => (None, None, None),
        };
        let mut credentials = Credentials::from_grant(
            self.access_token,
            self.refresh_token,
            self.token_type,
            self.expires_in,
            email,
        );
        credentials.workspace_id = workspace_id;
        credentials.project_id = project_id;
        credentials
    }
}

#[derive(Deserialize)]
pub(crate) struct DeviceTokenError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Classification of a single poll response.
pub(crate) enum PollStatus {
    Pending,
    Succeeded(Box<TokenGrant>),
    Expired,
    Denied,
}

/// Terminal result of a full poll loop.
#[derive(Debug)]
pub(crate) enum PollOutcome {
    Succeeded(Credentials),
    Expired,
    Denied,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    #[test]
    fn grant_conversion_derives_absolute_expiry() {
        let grant = TokenGrant {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            token_type: None,
            expires_in: 3600,
            user: Some(TokenUser {
                email: Some("edge@example.com".to_string()),
                workspace_id: Some("ws-1".to_string()),
                project_id: None,
            }),
        };
        let before = Utc::now();
        let credentials = grant.into_credentials();
        let after = Utc::now();

        assert!(credentials.expires_at >= before + ChronoDuration::seconds(3600));
        assert!(credentials.expires_at <= after + ChronoDuration::seconds(3600));
        assert_eq!(credentials.token_type, "Bearer");
        assert_eq!(credentials.email.as_deref(), Some("edge@example.com"));
        assert_eq!(credentials.workspace_id.as_deref(), Some("ws-1"));
    }

    #[test]
    fn session_debug_never_shows_device_code() {
        let session = DeviceAuthSession {
            device_code: "opaque-device-code".to_string(),
            user_code: "ABCD-1234".to_string(),
            verification_url: "https://app.cyberwave.com/activate".to_string(),
            expires_in: 600,
            interval: 5,
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("opaque-device-code"));
        assert!(rendered.contains("ABCD-1234"));
    }
}
