use admission::{AdmissionController, Clock, SystemClock};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::warn;
use workflow::{Edge, Node};

use crate::backend::ExecutionBackend;
use crate::config::SandboxConfig;
use crate::error::{BackendError, BackendResult};
use crate::types::{ComponentTest, InputValidation, SandboxId, SandboxMetrics, SandboxResult, TestReport};

/// Backend decorator that admits each remote call through an
/// [`AdmissionController`] keyed by operation name.
///
/// `destroy` is never throttled so sessions can always release resources.
pub struct ThrottledBackend<B, C: Clock = SystemClock> {
    inner: B,
    limiter: Mutex<AdmissionController<C>>,
}

impl<B: ExecutionBackend, C: Clock> ThrottledBackend<B, C> {
    pub fn new(inner: B, limiter: AdmissionController<C>) -> Self {
        Self {
            inner,
            limiter: Mutex::new(limiter),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    async fn admit(&self, operation: &str) -> BackendResult<()> {
        let mut limiter = self.limiter.lock().await;
        if limiter.check_limit(operation) {
            return Ok(());
        }
        let rejection = limiter.exceeded(operation);
        warn!(backend = self.inner.name(), operation, "backend call throttled");
        Err(BackendError::Throttled(rejection))
    }
}

#[async_trait]
impl<B, C> ExecutionBackend for ThrottledBackend<B, C>
where
    B: ExecutionBackend,
    C: Clock + 'static,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn create(&self, workflow_id: &str, config: &SandboxConfig) -> BackendResult<SandboxId> {
        self.admit("create").await?;
        self.inner.create(workflow_id, config).await
    }

    async fn execute(
        &self,
        sandbox_id: &SandboxId,
        nodes: &[Node],
        edges: &[Edge],
        input: &Value,
    ) -> BackendResult<SandboxResult> {
        self.admit("execute").await?;
        self.inner.execute(sandbox_id, nodes, edges, input).await
    }

    async fn test(
        &self,
        sandbox_id: &SandboxId,
        component_id: &str,
        tests: &[ComponentTest],
    ) -> BackendResult<TestReport> {
        self.admit("test").await?;
        self.inner.test(sandbox_id, component_id, tests).await
    }

    async fn validate(
        &self,
        sandbox_id: &SandboxId,
        component_id: &str,
        input: &Value,
    ) -> BackendResult<InputValidation> {
        self.admit("validate").await?;
        self.inner.validate(sandbox_id, component_id, input).await
    }

    async fn metrics(&self, sandbox_id: &SandboxId) -> BackendResult<SandboxMetrics> {
        self.admit("metrics").await?;
        self.inner.metrics(sandbox_id).await
    }

    async fn destroy(&self, sandbox_id: &SandboxId) -> BackendResult<()> {
        self.inner.destroy(sandbox_id).await
    }
}
