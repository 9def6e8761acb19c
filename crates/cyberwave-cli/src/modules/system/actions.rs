use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::modules::identity::{ephemeral_identity, IdentityStore};
use crate::modules::session::Session;

use super::paths::Paths;

pub(crate) fn handle_status(session: &Session<'_>) -> anyhow::Result<()> {
    println!("Environment:  {}", session.environment.name);
    println!("Backend:      {}", session.environment.backend_url);
    println!("Frontend:     {}", session.environment.frontend_url);
    println!("Mode:         {}", session.mode);
    println!("Node:         {}", session.identity.node_id);

    match session.vault.load() {
        Some(credentials) => {
            let state = if credentials.is_valid() {
                "valid"
            } else {
                "expired"
            };
            let who = credentials
                .email
                .clone()
                .unwrap_or_else(|| "<unknown>".to_string());
            println!(
                "Auth:         {state} ({who}, expires {})",
                credentials.expires_at.to_rfc3339()
            );
            if let Some(workspace_id) = &credentials.workspace_id {
                println!("Workspace:    {workspace_id}");
            }
        }
        None => println!("Auth:         not authenticated"),
    }

    let pending = session.connectivity.queue.len();
    println!("Pending sync: {pending}");
    if pending > 0 && !session.mode.is_online() {
        println!("Queued records will upload once the backend is reachable.");
    }
    Ok(())
}

pub(crate) fn handle_whoami(paths: &Paths) -> anyhow::Result<()> {
    let store = IdentityStore::new(paths.identity_file());
    let identity = match store.get_or_create() {
        Ok(identity) => identity,
        Err(err) => {
            warn!(error = %err, "identity store unusable; showing an unpersisted identity");
            ephemeral_identity()
        }
    };

    println!("Node ID:       {}", identity.node_id);
    println!("Name:          {}", identity.node_name);
    println!("Hostname:      {}", identity.hostname);
    println!("Platform:      {}-{}", identity.platform, identity.architecture);
    println!(
        "MAC:           {}",
        identity.mac_address.as_deref().unwrap_or("unknown")
    );
    println!("Installation:  {}", identity.installation_id);
    println!("Version:       {}", identity.version);
    println!("Created:       {}", identity.created_at.to_rfc3339());
    println!("Last seen:     {}", identity.last_seen.to_rfc3339());
    Ok(())
}

pub(crate) async fn handle_sync(
    session: &Session<'_>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let report = session.sync_pending(cancel).await?;
    if report.delivered == 0 && report.requeued == 0 {
        println!("Nothing to sync");
    } else {
        println!(
            "Synced {} record(s); {} requeued",
            report.delivered, report.requeued
        );
    }
    Ok(())
}
