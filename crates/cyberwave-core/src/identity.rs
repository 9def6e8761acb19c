use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable identity of one edge installation.
///
/// `node_id` is generated exactly once and survives upgrades; everything a
/// registration or heartbeat payload says about this machine hangs off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub node_id: String,
    pub node_name: String,
    pub platform: String,
    pub architecture: String,
    pub hostname: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    pub installation_id: Uuid,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl NodeIdentity {
    pub fn new(hostname: String, mac_address: Option<String>, version: String) -> Self {
        let now = Utc::now();
        let node_id = generate_node_id();
        Self {
            node_name: hostname.clone(),
            node_id,
            platform: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            hostname,
            mac_address,
            installation_id: Uuid::new_v4(),
            version,
            created_at: now,
            last_seen: now,
        }
    }
}

/// Generate a globally unique node id of the form
/// `edge_{timestamp_hex}{random_hex}`.
///
/// The suffix carries 8 random bytes, so collisions across installations are
/// negligible even when two nodes are provisioned in the same second.
pub fn generate_node_id() -> String {
    let timestamp = Utc::now().timestamp().max(0) as u64;
    let mut suffix = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut suffix);
    format!("edge_{timestamp:x}{}", hex::encode(suffix))
}
