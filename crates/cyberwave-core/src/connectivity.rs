use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operating mode for one CLI invocation.
///
/// `Hybrid` and `Offline` both promise that no operation blocks indefinitely
/// on network I/O; `Online` is only entered after a successful health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityMode {
    Online,
    Hybrid,
    Offline,
}

impl ConnectivityMode {
    /// Fold probe outcome and credential presence into a mode: reachable
    /// wins, cached credentials rescue an unreachable backend into `Hybrid`,
    /// and everything else is purely local.
    pub fn resolve(reachable: bool, has_cached_credentials: bool) -> Self {
        if reachable {
            Self::Online
        } else if has_cached_credentials {
            Self::Hybrid
        } else {
            Self::Offline
        }
    }

    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl std::fmt::Display for ConnectivityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Online => "online",
            Self::Hybrid => "hybrid",
            Self::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// One locally recorded operation awaiting upload.
///
/// The client-generated `id` travels with the record on replay so the server
/// can deduplicate; delivery is at-least-once from this side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRecord {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub queued_at: DateTime<Utc>,
}

impl PendingRecord {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            payload,
            queued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reachable_resolves_online() {
        assert_eq!(
            ConnectivityMode::resolve(true, false),
            ConnectivityMode::Online
        );
        assert_eq!(
            ConnectivityMode::resolve(true, true),
            ConnectivityMode::Online
        );
    }

    #[test]
    fn unreachable_with_credentials_resolves_hybrid() {
        assert_eq!(
            ConnectivityMode::resolve(false, true),
            ConnectivityMode::Hybrid
        );
    }

    #[test]
    fn unreachable_without_credentials_resolves_offline() {
        assert_eq!(
            ConnectivityMode::resolve(false, false),
            ConnectivityMode::Offline
        );
    }

    #[test]
    fn pending_records_get_unique_ids() {
        let first = PendingRecord::new("event", serde_json::json!({"n": 1}));
        let second = PendingRecord::new("event", serde_json::json!({"n": 1}));
        assert_ne!(first.id, second.id);
    }
}
