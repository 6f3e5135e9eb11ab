use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use workflow::{Edge, Node};

use crate::backend::ExecutionBackend;
use crate::config::SandboxConfig;
use crate::error::{BackendError, Result, SessionError};
use crate::poller::{MetricsPoller, MetricsSlot};
use crate::types::{
    ComponentTest, InputValidation, SandboxId, SandboxMetrics, SandboxResult, SessionStatus,
    TestReport,
};

/// Cadence of background metrics polling while a session is active.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

const CREATE_FAILED: &str = "failed to create sandbox";
const EXECUTE_FAILED: &str = "failed to execute workflow in sandbox";
const TEST_FAILED: &str = "failed to run component tests";
const VALIDATE_FAILED: &str = "failed to validate component input";
const METRICS_FAILED: &str = "failed to collect sandbox metrics";
const CLEANUP_FAILED: &str = "failed to clean up sandbox";

struct ActiveSession {
    id: SandboxId,
    workflow_id: String,
    config: SandboxConfig,
    poller: MetricsPoller,
}

/// Owns at most one remote sandbox at a time.
///
/// `NO_SESSION --create--> ACTIVE --cleanup--> NO_SESSION`. While active,
/// metrics are polled in the background and only the latest snapshot is kept.
///
/// [`scoped`](Self::scoped) releases the sandbox on every exit path. Dropping
/// the manager with a live session is best-effort only: destroy is spawned on
/// the current runtime and is lost if that runtime shuts down first.
pub struct SandboxSessionManager {
    backend: Arc<dyn ExecutionBackend>,
    poll_interval: Duration,
    session: Option<ActiveSession>,
    metrics: Arc<Mutex<MetricsSlot>>,
}

impl SandboxSessionManager {
    pub fn new(backend: Arc<dyn ExecutionBackend>) -> Self {
        Self {
            backend,
            poll_interval: DEFAULT_POLL_INTERVAL,
            session: None,
            metrics: Arc::new(Mutex::new(MetricsSlot::default())),
        }
    }

    /// Takes effect for the next session created.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn status(&self) -> SessionStatus {
        match self.session {
            Some(_) => SessionStatus::Active,
            None => SessionStatus::NoSession,
        }
    }

    pub fn session_id(&self) -> Option<&SandboxId> {
        self.session.as_ref().map(|s| &s.id)
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.workflow_id.as_str())
    }

    pub fn config(&self) -> Option<&SandboxConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    /// Most recent metrics snapshot of the active session, if any poll has landed.
    pub async fn latest_metrics(&self) -> Option<SandboxMetrics> {
        if self.session.is_none() {
            return None;
        }
        self.metrics.lock().await.latest()
    }

    /// Create a session, run `body` against it, then clean up.
    ///
    /// Cleanup runs whether `body` succeeds or fails. An error from `body`
    /// takes precedence over a cleanup failure.
    pub async fn scoped<T, F>(
        &mut self,
        workflow_id: &str,
        config: SandboxConfig,
        body: F,
    ) -> Result<T>
    where
        F: AsyncFnOnce(&SandboxSessionManager) -> Result<T>,
    {
        self.create_sandbox(workflow_id, config).await?;
        let outcome = body(&*self).await;
        let cleaned = self.cleanup_sandbox().await;
        let value = outcome?;
        cleaned?;
        Ok(value)
    }

    pub async fn create_sandbox(
        &mut self,
        workflow_id: &str,
        config: SandboxConfig,
    ) -> Result<SandboxId> {
        if let Some(active) = &self.session {
            return Err(SessionError::SessionActive(active.id.clone()));
        }
        if self.poll_interval.is_zero() {
            return Err(SessionError::InvalidConfig(
                "metrics poll interval must be positive".into(),
            ));
        }
        config.validate()?;

        let id = self
            .backend
            .create(workflow_id, &config)
            .await
            .map_err(|e| backend_failure(CREATE_FAILED, e))?;

        self.metrics.lock().await.open(id.clone());
        let poller = MetricsPoller::start(
            Arc::clone(&self.backend),
            id.clone(),
            Arc::clone(&self.metrics),
            self.poll_interval,
        );
        info!(
            backend = self.backend.name(),
            sandbox_id = %id,
            workflow_id,
            environment = ?config.environment,
            "sandbox session started"
        );

        self.session = Some(ActiveSession {
            id: id.clone(),
            workflow_id: workflow_id.to_owned(),
            config,
            poller,
        });
        Ok(id)
    }

    /// Run a workflow graph in the active sandbox.
    ///
    /// Metrics in the returned result are not merged into the polled snapshot.
    pub async fn execute_in_sandbox(
        &self,
        nodes: &[Node],
        edges: &[Edge],
        input: &Value,
    ) -> Result<SandboxResult> {
        let id = self.active_id()?;
        self.backend
            .execute(id, nodes, edges, input)
            .await
            .map_err(|e| backend_failure(EXECUTE_FAILED, e))
    }

    pub async fn run_component_tests(
        &self,
        component_id: &str,
        tests: &[ComponentTest],
    ) -> Result<TestReport> {
        let id = self.active_id()?;
        self.backend
            .test(id, component_id, tests)
            .await
            .map_err(|e| backend_failure(TEST_FAILED, e))
    }

    pub async fn validate_input(&self, component_id: &str, input: &Value) -> Result<InputValidation> {
        let id = self.active_id()?;
        self.backend
            .validate(id, component_id, input)
            .await
            .map_err(|e| backend_failure(VALIDATE_FAILED, e))
    }

    /// Fetch metrics now and make them the current snapshot.
    pub async fn collect_metrics(&self) -> Result<SandboxMetrics> {
        let id = self.active_id()?;
        let metrics = self
            .backend
            .metrics(id)
            .await
            .map_err(|e| backend_failure(METRICS_FAILED, e))?;
        self.metrics.lock().await.store(id, metrics.clone());
        Ok(metrics)
    }

    /// Stop polling, destroy the remote sandbox and return to `NoSession`.
    ///
    /// A no-op without a session. The session is released before the backend
    /// is called, so the manager is in `NoSession` even if destroy fails or
    /// this future is dropped; a cancelled destroy is handed to the runtime.
    pub async fn cleanup_sandbox(&mut self) -> Result<()> {
        let Some(active) = self.session.take() else {
            return Ok(());
        };
        active.poller.stop();
        let id = active.id.clone();
        let pending = PendingDestroy::new(Arc::clone(&self.backend), active.id);

        self.metrics.lock().await.close();
        let destroyed = self.backend.destroy(&id).await;
        pending.disarm();

        match destroyed {
            Ok(()) => {
                info!(sandbox_id = %id, "sandbox session cleaned up");
                Ok(())
            }
            Err(e) => Err(backend_failure(CLEANUP_FAILED, e)),
        }
    }

    fn active_id(&self) -> Result<&SandboxId> {
        self.session_id().ok_or(SessionError::NoActiveSession)
    }
}

impl Drop for SandboxSessionManager {
    fn drop(&mut self) {
        let Some(active) = self.session.take() else {
            return;
        };
        active.poller.stop();
        warn!(sandbox_id = %active.id, "session dropped while active, destroying sandbox");
        spawn_destroy(Arc::clone(&self.backend), active.id);
    }
}

/// Destroys the sandbox in the background unless disarmed.
struct PendingDestroy {
    backend: Arc<dyn ExecutionBackend>,
    id: Option<SandboxId>,
}

impl PendingDestroy {
    fn new(backend: Arc<dyn ExecutionBackend>, id: SandboxId) -> Self {
        Self {
            backend,
            id: Some(id),
        }
    }

    fn disarm(mut self) {
        self.id = None;
    }
}

impl Drop for PendingDestroy {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            warn!(sandbox_id = %id, "cleanup cancelled, destroying sandbox in background");
            spawn_destroy(Arc::clone(&self.backend), id);
        }
    }
}

fn spawn_destroy(backend: Arc<dyn ExecutionBackend>, id: SandboxId) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        error!(sandbox_id = %id, "no runtime to destroy sandbox, it will leak");
        return;
    };
    runtime.spawn(async move {
        if let Err(e) = backend.destroy(&id).await {
            error!(sandbox_id = %id, error = %e, "background sandbox destroy failed");
        }
    });
}

fn backend_failure(message: &'static str, source: BackendError) -> SessionError {
    error!(error = %source, "{message}");
    SessionError::Backend { message, source }
}
