use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use tracing::debug;

use cyberwave_core::{Error, NodeIdentity, PendingRecord, REQUEST_TIMEOUT_SECS};

/// Single bounded-timeout reachability probe. Never errors: anything short
/// of a 2xx within the timeout is simply "unreachable".
pub(crate) async fn probe(
    client: &reqwest::Client,
    backend_url: &str,
    timeout: Duration,
) -> bool {
    let url = format!("{backend_url}/health");
    match client.get(&url).timeout(timeout).send().await {
        Ok(response) => {
            let reachable = response.status().is_success();
            debug!(status = %response.status(), reachable, "health probe");
            reachable
        }
        Err(err) => {
            debug!(error = %err, "health probe failed");
            false
        }
    }
}

pub(crate) async fn register_node(
    client: &reqwest::Client,
    backend_url: &str,
    bearer: &str,
    identity: &NodeIdentity,
) -> Result<(), Error> {
    let url = format!("{backend_url}/api/v1/edges/register");
    post_authorized(client, &url, bearer, serde_json::json!(identity)).await
}

pub(crate) async fn send_heartbeat(
    client: &reqwest::Client,
    backend_url: &str,
    bearer: &str,
    identity: &NodeIdentity,
) -> Result<(), Error> {
    let url = format!("{backend_url}/api/v1/edges/heartbeat");
    let payload = serde_json::json!({
        "node_id": identity.node_id,
        "last_seen": identity.last_seen,
        "version": identity.version,
    });
    post_authorized(client, &url, bearer, payload).await
}

/// Upload one event record. The record keeps its client-generated id so a
/// replay after a lost response is deduplicated server-side.
pub(crate) async fn push_event(
    client: &reqwest::Client,
    backend_url: &str,
    bearer: &str,
    node_id: &str,
    record: &PendingRecord,
) -> Result<(), Error> {
    let url = format!("{backend_url}/api/v1/edges/events");
    let payload = serde_json::json!({
        "id": record.id,
        "node_id": node_id,
        "kind": record.kind,
        "payload": record.payload,
        "queued_at": record.queued_at,
    });
    post_authorized(client, &url, bearer, payload).await
}

async fn post_authorized(
    client: &reqwest::Client,
    url: &str,
    bearer: &str,
    payload: serde_json::Value,
) -> Result<(), Error> {
    let response = client
        .post(url)
        .header(AUTHORIZATION, bearer)
        .json(&payload)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .send()
        .await
        .map_err(Error::transport)?;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::backend(status, body));
    }
    Ok(())
}
