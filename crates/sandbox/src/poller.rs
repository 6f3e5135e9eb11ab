//! Background metrics polling for the active session.
//!
//! One poll is in flight at most: each tick awaits the previous request, and
//! ticks missed meanwhile are skipped rather than queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::ExecutionBackend;
use crate::types::{SandboxId, SandboxMetrics};

/// Latest metrics, tagged with the session they belong to.
#[derive(Debug, Default)]
pub(crate) struct MetricsSlot {
    session: Option<SandboxId>,
    latest: Option<SandboxMetrics>,
}

impl MetricsSlot {
    pub(crate) fn open(&mut self, sandbox_id: SandboxId) {
        self.session = Some(sandbox_id);
        self.latest = None;
    }

    pub(crate) fn close(&mut self) {
        self.session = None;
        self.latest = None;
    }

    /// Replace the snapshot if `sandbox_id` is still the open session.
    pub(crate) fn store(&mut self, sandbox_id: &SandboxId, metrics: SandboxMetrics) -> bool {
        if self.session.as_ref() != Some(sandbox_id) {
            return false;
        }
        self.latest = Some(metrics);
        true
    }

    pub(crate) fn latest(&self) -> Option<SandboxMetrics> {
        self.latest.clone()
    }
}

/// Handle to a running poll loop. Dropping it stops the loop.
pub(crate) struct MetricsPoller {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl MetricsPoller {
    pub(crate) fn start(
        backend: Arc<dyn ExecutionBackend>,
        sandbox_id: SandboxId,
        slot: Arc<Mutex<MetricsSlot>>,
        period: Duration,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            shutdown.clone(),
            backend,
            sandbox_id,
            slot,
            period,
        ));
        Self { shutdown, handle }
    }

    pub(crate) fn stop(&self) {
        self.shutdown.cancel();
        self.handle.abort();
    }
}

impl Drop for MetricsPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    shutdown: CancellationToken,
    backend: Arc<dyn ExecutionBackend>,
    sandbox_id: SandboxId,
    slot: Arc<Mutex<MetricsSlot>>,
    period: Duration,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            result = backend.metrics(&sandbox_id) => result,
        };

        match result {
            Ok(metrics) => {
                if !slot.lock().await.store(&sandbox_id, metrics) {
                    debug!(sandbox_id = %sandbox_id, "session closed, discarding late metrics");
                    break;
                }
            }
            Err(e) => {
                warn!(sandbox_id = %sandbox_id, error = %e, "metrics poll failed, retrying next tick");
            }
        }
    }
    debug!(sandbox_id = %sandbox_id, "metrics polling stopped");
}
