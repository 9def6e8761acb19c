use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use cyberwave_core::{
    Credentials, Error, NodeIdentity, MAX_POLL_TRANSPORT_ERRORS, REQUEST_TIMEOUT_SECS,
};

use super::types::{
    DeviceAuthSession, DeviceInitiateRequest, DeviceTokenError, DeviceTokenRequest, PollOutcome,
    PollStatus, RefreshRequest, TokenGrant,
};

/// Client half of the device-authorization grant.
///
/// State machine: `Idle -> Initiated -> Polling -> {Succeeded | Expired |
/// Denied | Error}`. `initiate` performs exactly one attempt; retry policy
/// belongs to the caller.
pub(crate) struct DeviceFlowClient<'a> {
    client: &'a reqwest::Client,
    backend_url: &'a str,
}

impl<'a> DeviceFlowClient<'a> {
    pub(crate) fn new(client: &'a reqwest::Client, backend_url: &'a str) -> Self {
        Self {
            client,
            backend_url,
        }
    }

    pub(crate) async fn initiate(
        &self,
        identity: &NodeIdentity,
    ) -> Result<DeviceAuthSession, Error> {
        let url = format!("{}/auth/device/initiate", self.backend_url);
        let payload = DeviceInitiateRequest {
            node_id: &identity.node_id,
            node_name: &identity.node_name,
            hostname: &identity.hostname,
            platform: &identity.platform,
            version: &identity.version,
        };
        let response = self
            .client
            .post(&url)
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
        let session: DeviceAuthSession = response.json().await.map_err(Error::transport)?;
        debug!(
            user_code = %session.user_code,
            expires_in = session.expires_in,
            interval = session.interval,
            "device authorization initiated"
        );
        Ok(session)
    }

    /// One poll round-trip, classified per the backend contract: 202 keeps
    /// polling, 200 carries the grant, 410 means the session expired, 400
    /// means the code was invalidated or the user denied the request.
    pub(crate) async fn poll_once(
        &self,
        session: &DeviceAuthSession,
        node_id: &str,
    ) -> Result<PollStatus, Error> {
        let url = format!("{}/auth/device/token", self.backend_url);
        let payload = DeviceTokenRequest {
            device_code: &session.device_code,
            node_id,
        };
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(Error::transport)?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            return Ok(PollStatus::Pending);
        }
        if status.is_success() {
            let grant: TokenGrant = response.json().await.map_err(Error::transport)?;
            return Ok(PollStatus::Succeeded(Box::new(grant)));
        }
        if status == StatusCode::GONE {
            return Ok(PollStatus::Expired);
        }
        if status == StatusCode::BAD_REQUEST {
            let error: DeviceTokenError =
                response.json().await.unwrap_or_else(|_| DeviceTokenError {
                    error: "invalid_device_code".to_string(),
                    error_description: None,
                });
            debug!(error = %error.error, "device token request rejected");
            return match error.error.as_str() {
                "invalid_device_code" | "access_denied" | "denied" => Ok(PollStatus::Denied),
                _ => Err(Error::backend(
                    400,
                    error.error_description.unwrap_or(error.error),
                )),
            };
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::backend(status.as_u16(), body))
    }

    /// Poll until the flow terminates, the session's lifetime runs out, or
    /// the caller cancels.
    ///
    /// Polls are spaced no tighter than `session.interval`; transient
    /// transport failures are retried with a stretched interval, but two in a
    /// row abort the loop. Cancellation is observed at every sleep boundary,
    /// not just before the network call.
    pub(crate) async fn poll(
        &self,
        session: &DeviceAuthSession,
        node_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, Error> {
        let interval = Duration::from_secs(session.interval.max(1));
        let deadline = Instant::now() + Duration::from_secs(session.expires_in.max(0) as u64);
        let mut consecutive_transport_errors: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled);
            }
            if Instant::now() >= deadline {
                return Ok(PollOutcome::Expired);
            }

            let mut sleep_for = interval;
            match self.poll_once(session, node_id).await {
                Ok(PollStatus::Pending) => {
                    consecutive_transport_errors = 0;
                }
                Ok(PollStatus::Succeeded(grant)) => {
                    return Ok(PollOutcome::Succeeded(grant.into_credentials()));
                }
                Ok(PollStatus::Expired) => return Ok(PollOutcome::Expired),
                Ok(PollStatus::Denied) => return Ok(PollOutcome::Denied),
                Err(Error::Transport(message)) => {
                    consecutive_transport_errors += 1;
                    if consecutive_transport_errors >= MAX_POLL_TRANSPORT_ERRORS {
                        return Err(Error::Transport(message));
                    }
                    warn!(error = %message, "transient poll failure; backing off");
                    sleep_for = interval * (consecutive_transport_errors + 1);
                }
                Err(err) => return Err(err),
            }

            tokio::select! {
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }
    }

    /// Exchange a refresh token for a fresh grant.
    pub(crate) async fn refresh(
        &self,
        refresh_token: &str,
        node_id: &str,
    ) -> Result<Credentials, Error> {
        let url = format!("{}/auth/device/refresh", self.backend_url);
        let payload = RefreshRequest {
            refresh_token,
            node_id,
        };
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(Error::transport)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            // The body may describe the rejected token; keep it out of the
            // error and log a status-only line instead.
            debug!(status, "token refresh rejected");
            return Err(Error::backend(status, "token refresh rejected"));
        }
        let grant: TokenGrant = response.json().await.map_err(Error::transport)?;
        Ok(grant.into_credentials())
    }
}
