use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cyberwave_core::{
    AuthError, ConnectivityMode, Credentials, Environment, Error, NodeIdentity, PendingRecord,
};

use crate::modules::auth::{run_device_flow, DeviceFlowClient};
use crate::modules::connectivity::{self, ConnectivityManager, PendingQueue, ReplayReport};
use crate::modules::identity::IdentityStore;
use crate::modules::vault::CredentialVault;
use crate::modules::system::Paths;

/// Single entry point for everything the CLI commands need: "ensure I am
/// authenticated", "give me a bearer token", "record this for later sync".
///
/// Constructed once per invocation and passed down; there is no hidden
/// global token cache.
pub(crate) struct Session<'a> {
    pub client: &'a reqwest::Client,
    pub environment: Environment,
    pub identity: NodeIdentity,
    pub vault: CredentialVault,
    pub connectivity: ConnectivityManager,
    pub mode: ConnectivityMode,
}

impl<'a> Session<'a> {
    /// Load identity and credentials, probe the backend, resolve the mode,
    /// and reconcile queued state. Storage failures degrade to in-memory
    /// operation instead of failing the invocation.
    pub(crate) async fn establish(
        client: &'a reqwest::Client,
        environment: Environment,
        paths: &Paths,
    ) -> Session<'a> {
        let identity_store = IdentityStore::new(paths.identity_file());
        let mut identity = match identity_store.get_or_create() {
            Ok(identity) => identity,
            Err(err) => {
                warn!(
                    error = %err,
                    "identity store unusable; continuing with an unpersisted identity for this run"
                );
                crate::modules::identity::ephemeral_identity()
            }
        };
        identity_store.touch_last_seen(&mut identity);

        let vault = CredentialVault::open(paths);
        let cached = vault.load();
        let connectivity = ConnectivityManager::new(PendingQueue::new(paths.pending_file()));
        let mode = connectivity
            .resolve_mode(client, &environment.backend_url, cached.is_some())
            .await;

        let session = Session {
            client,
            environment,
            identity,
            vault,
            connectivity,
            mode,
        };
        session.reconcile(cached).await;
        session
    }

    /// Best-effort reconciliation once `Online` is re-resolved: heartbeat,
    /// then replay of the pending queue.
    async fn reconcile(&self, cached: Option<Credentials>) {
        if !self.mode.is_online() {
            return;
        }
        let Some(credentials) = cached.filter(Credentials::is_valid) else {
            return;
        };
        let bearer = credentials.authorization_header();

        if let Err(err) = connectivity::http::send_heartbeat(
            self.client,
            &self.environment.backend_url,
            &bearer,
            &self.identity,
        )
        .await
        {
            debug!(error = %err, "heartbeat failed");
        }

        if self.connectivity.queue.len() > 0 {
            match self
                .connectivity
                .replay_pending(
                    self.client,
                    &self.environment.backend_url,
                    &bearer,
                    &self.identity.node_id,
                )
                .await
            {
                Ok(report) if report.delivered > 0 => {
                    info!(
                        delivered = report.delivered,
                        requeued = report.requeued,
                        "replayed queued offline records"
                    );
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "pending queue replay failed"),
            }
        }
    }

    /// Return usable credentials, refreshing or re-authorizing as needed.
    ///
    /// Cached valid credentials win. Expired ones are refreshed when the
    /// backend is reachable; while it is not, the cache is all there is and
    /// is returned as-is (hybrid operation). With nothing cached the device
    /// flow runs, but only when `interactive` allows it.
    pub(crate) async fn ensure_authenticated(
        &self,
        interactive: bool,
        cancel: &CancellationToken,
    ) -> Result<Credentials, Error> {
        if let Some(credentials) = self.vault.load() {
            if credentials.is_valid() {
                return Ok(credentials);
            }
            if !self.mode.is_online() {
                debug!("stale credentials retained while the backend is unreachable");
                return Ok(credentials);
            }
            if let Some(refresh_token) = credentials.refresh_token.clone() {
                let flow = DeviceFlowClient::new(self.client, &self.environment.backend_url);
                match flow.refresh(&refresh_token, &self.identity.node_id).await {
                    Ok(mut refreshed) => {
                        // The refresh payload may omit account fields; keep
                        // the ones we already know.
                        if refreshed.email.is_none() {
                            refreshed.email = credentials.email.clone();
                        }
                        if refreshed.workspace_id.is_none() {
                            refreshed.workspace_id = credentials.workspace_id.clone();
                        }
                        if refreshed.project_id.is_none() {
                            refreshed.project_id = credentials.project_id.clone();
                        }
                        self.vault.save(&refreshed)?;
                        return Ok(refreshed);
                    }
                    Err(Error::Backend { status, .. })
                        if status == 400 || status == 401 || status == 403 =>
                    {
                        warn!(status, "refresh token rejected; interactive login required");
                        if let Err(err) = self.vault.clear() {
                            warn!(error = %err, "could not clear rejected credentials");
                        }
                    }
                    Err(err) => return Err(err),
                }
            } else if let Err(err) = self.vault.clear() {
                warn!(error = %err, "could not clear expired credentials");
            }
        }

        if !interactive {
            return Err(AuthError::NotAuthenticated.into());
        }
        if !self.mode.is_online() {
            return Err(Error::transport(
                "backend unreachable; cannot start device login",
            ));
        }
        run_device_flow(
            self.client,
            &self.environment,
            &self.identity,
            &self.vault,
            false,
            cancel,
        )
        .await
    }

    /// `Authorization` header value for the next request, or `None` when
    /// operating offline (callers then work purely locally).
    pub(crate) fn bearer_for_request(&self) -> Option<String> {
        if self.mode == ConnectivityMode::Offline {
            return None;
        }
        self.vault
            .load()
            .map(|credentials| credentials.authorization_header())
    }

    /// Deliver an event now when possible, otherwise queue it with an
    /// explicit notice instead of dropping it silently.
    pub(crate) async fn record_offline(
        &self,
        kind: &str,
        payload: serde_json::Value,
    ) -> Result<(), Error> {
        let record = PendingRecord::new(kind, payload);
        if self.mode.is_online() {
            if let Some(bearer) = self.bearer_for_request() {
                match connectivity::http::push_event(
                    self.client,
                    &self.environment.backend_url,
                    &bearer,
                    &self.identity.node_id,
                    &record,
                )
                .await
                {
                    Ok(()) => return Ok(()),
                    Err(err) => warn!(error = %err, "direct upload failed; queueing record"),
                }
            }
        }
        self.connectivity.enqueue_pending(&record)?;
        println!(
            "Queued {} record for later sync ({} pending)",
            record.kind,
            self.connectivity.queue.len()
        );
        Ok(())
    }

    /// Drain and replay the pending queue. Requires reachability and valid
    /// (possibly freshly refreshed) credentials.
    pub(crate) async fn sync_pending(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ReplayReport, Error> {
        if !self.mode.is_online() {
            return Err(Error::transport(format!(
                "backend unreachable (mode: {})",
                self.mode
            )));
        }
        let credentials = self.ensure_authenticated(false, cancel).await?;
        self.connectivity
            .replay_pending(
                self.client,
                &self.environment.backend_url,
                &credentials.authorization_header(),
                &self.identity.node_id,
            )
            .await
    }
}
