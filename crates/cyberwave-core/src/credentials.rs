use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

/// Safety margin subtracted from `expires_at` when deciding whether an
/// access token is still usable. Tokens inside the margin are refreshed
/// proactively instead of failing mid-request.
pub const REFRESH_SKEW_SECONDS: i64 = 60;

/// Tokens and account defaults obtained from a completed device-flow grant.
///
/// Owned exclusively by the credential vault; other components only see this
/// through the vault's load/save/clear operations.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Credentials {
    /// Build credentials from a token grant, deriving the absolute expiry
    /// from `expires_in` at receipt time.
    pub fn from_grant(
        access_token: String,
        refresh_token: Option<String>,
        token_type: Option<String>,
        expires_in: i64,
        email: Option<String>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: token_type.unwrap_or_else(default_token_type),
            expires_at: Utc::now() + ChronoDuration::seconds(expires_in),
            email,
            workspace_id: None,
            project_id: None,
        }
    }

    /// A credential is usable only while `now < expires_at - skew`; the
    /// boundary itself counts as expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        now < self.expires_at - ChronoDuration::seconds(REFRESH_SKEW_SECONDS)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Value for the `Authorization` request header.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

// Tokens must never leak through log output or error context.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("email", &self.email)
            .field("workspace_id", &self.workspace_id)
            .field("project_id", &self.project_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_credentials(expires_at: DateTime<Utc>) -> Credentials {
        Credentials {
            access_token: "token".to_string(),
            refresh_token: Some("refresh".to_string()),
            token_type: "Bearer".to_string(),
            expires_at,
            email: None,
            workspace_id: None,
            project_id: None,
        }
    }

    #[test]
    fn valid_well_before_expiry() {
        let now = Utc::now();
        let credentials = make_credentials(now + ChronoDuration::seconds(3600));
        assert!(credentials.is_valid_at(now));
    }

    #[test]
    fn expired_at_exact_expiry() {
        let now = Utc::now();
        let credentials = make_credentials(now);
        assert!(!credentials.is_valid_at(now));
    }

    #[test]
    fn expired_inside_skew_window() {
        let now = Utc::now();
        let credentials = make_credentials(now + ChronoDuration::seconds(REFRESH_SKEW_SECONDS));
        assert!(!credentials.is_valid_at(now));
    }

    #[test]
    fn valid_just_outside_skew_window() {
        let now = Utc::now();
        let credentials =
            make_credentials(now + ChronoDuration::seconds(REFRESH_SKEW_SECONDS + 1));
        assert!(credentials.is_valid_at(now));
    }

    #[test]
    fn empty_access_token_is_never_valid() {
        let now = Utc::now();
        let mut credentials = make_credentials(now + ChronoDuration::seconds(3600));
        credentials.access_token = String::new();
        assert!(!credentials.is_valid_at(now));
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let mut credentials = make_credentials(Utc::now());
        credentials.access_token = "super-secret-access".to_string();
        credentials.refresh_token = Some("super-secret-refresh".to_string());
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn serde_roundtrip_preserves_fields() {
        let credentials = make_credentials(Utc::now() + ChronoDuration::seconds(60));
        let raw = serde_json::to_string(&credentials).expect("serialize");
        let restored: Credentials = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(credentials, restored);
    }
}
