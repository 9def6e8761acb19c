use std::io::IsTerminal;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use cyberwave_core::{AuthError, Credentials, Environment, Error, NodeIdentity, PendingRecord};

use crate::cli_args::LoginArgs;
use crate::modules::connectivity;
use crate::modules::session::Session;
use crate::modules::vault::CredentialVault;

use super::http::DeviceFlowClient;
use super::types::PollOutcome;

pub(crate) async fn handle_login(
    args: LoginArgs,
    session: &mut Session<'_>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    if !session.mode.is_online() {
        anyhow::bail!(
            "backend unreachable at {}; cannot start device login",
            session.environment.backend_url
        );
    }

    if !args.force {
        if let Some(credentials) = session.vault.load() {
            if credentials.is_valid() {
                let who = credentials
                    .email
                    .unwrap_or_else(|| "this device".to_string());
                println!("Already logged in as {who} (use --force to re-authorize)");
                return Ok(());
            }
        }
    }

    let credentials = run_device_flow(
        session.client,
        &session.environment,
        &session.identity,
        &session.vault,
        args.no_browser,
        cancel,
    )
    .await?;

    // Registration rides on every successful login; a failure is queued for
    // the next sync rather than failing the login.
    match connectivity::http::register_node(
        session.client,
        &session.environment.backend_url,
        &credentials.authorization_header(),
        &session.identity,
    )
    .await
    {
        Ok(()) => debug!(node_id = %session.identity.node_id, "node registered"),
        Err(err) => {
            warn!(error = %err, "node registration failed; queueing for later sync");
            let record = PendingRecord::new("registration", serde_json::json!(&session.identity));
            if let Err(err) = session.connectivity.enqueue_pending(&record) {
                warn!(error = %err, "could not queue registration record");
            }
        }
    }

    let who = credentials
        .email
        .clone()
        .unwrap_or_else(|| "this device".to_string());
    println!("Logged in as {who}");
    if let Some(workspace_id) = &credentials.workspace_id {
        println!("Workspace: {workspace_id}");
    }
    Ok(())
}

/// Run the full device-authorization grant and persist the resulting
/// credentials before returning them.
pub(crate) async fn run_device_flow(
    client: &reqwest::Client,
    environment: &Environment,
    identity: &NodeIdentity,
    vault: &CredentialVault,
    no_browser: bool,
    cancel: &CancellationToken,
) -> Result<Credentials, Error> {
    let flow = DeviceFlowClient::new(client, &environment.backend_url);
    let session = flow.initiate(identity).await?;

    println!();
    println!("To authorize this device, visit: {}", session.verification_url);
    println!("and enter the code: {}", session.user_code);
    println!();
    if !no_browser && std::io::stdout().is_terminal() {
        // Headless hosts land here; the printed URL above is the fallback.
        if open::that(&session.verification_url).is_err() {
            debug!("could not open a browser for the verification URL");
        }
    }
    println!("Waiting for authorization (Ctrl-C to cancel)...");

    match flow.poll(&session, &identity.node_id, cancel).await? {
        PollOutcome::Succeeded(credentials) => {
            vault.save(&credentials)?;
            Ok(credentials)
        }
        PollOutcome::Expired => {
            eprintln!("The device authorization expired before it was approved.");
            eprintln!(
                "Run `cyberwave login` again, then visit {} and enter the new code (the old one was {}).",
                session.verification_url, session.user_code
            );
            Err(AuthError::Expired.into())
        }
        PollOutcome::Denied => {
            eprintln!(
                "The request for code {} was denied at {}.",
                session.user_code, session.verification_url
            );
            Err(AuthError::Denied.into())
        }
        PollOutcome::Cancelled => {
            eprintln!("Login cancelled; the pending authorization will expire on its own.");
            Err(AuthError::NotAuthenticated.into())
        }
    }
}

pub(crate) fn handle_logout(session: &Session<'_>) -> anyhow::Result<()> {
    session.vault.clear()?;
    println!("Logged out");
    Ok(())
}
