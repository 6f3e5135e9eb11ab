use async_trait::async_trait;
use serde_json::Value;
use workflow::{Edge, Node};

use crate::config::SandboxConfig;
use crate::error::BackendResult;
use crate::types::{ComponentTest, InputValidation, SandboxId, SandboxMetrics, SandboxResult, TestReport};

/// Remote service hosting sandboxes. The transport and wire format belong to
/// the implementation.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Human-readable name for this backend implementation (e.g. "remote").
    fn name(&self) -> &str;
    /// Provision a sandbox bound to `workflow_id`.
    async fn create(&self, workflow_id: &str, config: &SandboxConfig) -> BackendResult<SandboxId>;
    /// Run a workflow graph against `input`.
    async fn execute(
        &self,
        sandbox_id: &SandboxId,
        nodes: &[Node],
        edges: &[Edge],
        input: &Value,
    ) -> BackendResult<SandboxResult>;
    /// Run test cases against a single component. The backend compares outputs.
    async fn test(
        &self,
        sandbox_id: &SandboxId,
        component_id: &str,
        tests: &[ComponentTest],
    ) -> BackendResult<TestReport>;
    async fn validate(
        &self,
        sandbox_id: &SandboxId,
        component_id: &str,
        input: &Value,
    ) -> BackendResult<InputValidation>;
    async fn metrics(&self, sandbox_id: &SandboxId) -> BackendResult<SandboxMetrics>;
    /// Release every resource held by the sandbox.
    async fn destroy(&self, sandbox_id: &SandboxId) -> BackendResult<()>;
}
