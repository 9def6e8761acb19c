pub(crate) mod http;
mod queue;

use std::time::Duration;

use tracing::{debug, warn};

use cyberwave_core::{ConnectivityMode, Error, PendingRecord, PROBE_TIMEOUT_SECS};

pub(crate) use queue::PendingQueue;

/// Decides the operating mode for this invocation and owns the
/// pending-sync queue.
pub(crate) struct ConnectivityManager {
    pub queue: PendingQueue,
    probe_timeout: Duration,
}

/// What a replay pass accomplished.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReplayReport {
    pub delivered: usize,
    pub requeued: usize,
}

impl ConnectivityManager {
    pub(crate) fn new(queue: PendingQueue) -> Self {
        Self {
            queue,
            probe_timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_probe_timeout(queue: PendingQueue, probe_timeout: Duration) -> Self {
        Self {
            queue,
            probe_timeout,
        }
    }

    /// Probe the backend and fold the result with credential presence.
    /// Modes are derived fresh per invocation and never persisted, so a
    /// configuration or environment change cannot observe a stale `Online`.
    pub(crate) async fn resolve_mode(
        &self,
        client: &reqwest::Client,
        backend_url: &str,
        has_cached_credentials: bool,
    ) -> ConnectivityMode {
        let reachable = http::probe(client, backend_url, self.probe_timeout).await;
        let mode = ConnectivityMode::resolve(reachable, has_cached_credentials);
        debug!(%mode, reachable, has_cached_credentials, "resolved connectivity mode");
        mode
    }

    pub(crate) fn enqueue_pending(&self, record: &PendingRecord) -> Result<(), Error> {
        self.queue.enqueue(record)
    }

    /// Replay every queued record against the backend. Delivery is
    /// at-least-once: records that fail go straight back into the queue for
    /// the next pass.
    pub(crate) async fn replay_pending(
        &self,
        client: &reqwest::Client,
        backend_url: &str,
        bearer: &str,
        node_id: &str,
    ) -> Result<ReplayReport, Error> {
        let records = self.queue.drain()?;
        if records.is_empty() {
            return Ok(ReplayReport::default());
        }

        let mut report = ReplayReport::default();
        for record in records {
            match http::push_event(client, backend_url, bearer, node_id, &record).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!(kind = %record.kind, error = %err, "replay failed; record requeued");
                    self.queue.enqueue(&record)?;
                    report.requeued += 1;
                }
            }
        }
        debug!(
            delivered = report.delivered,
            requeued = report.requeued,
            "pending queue replay finished"
        );
        Ok(report)
    }
}
