use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend-issued sandbox identifier. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SandboxId(String);

impl SandboxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SandboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SandboxId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SandboxId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    NoSession,
    Active,
}

/// Resource usage reported by the backend for a running sandbox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxMetrics {
    /// Milliseconds of execution time consumed so far.
    pub execution_time: u64,
    /// Resident memory in megabytes.
    pub memory_usage: u64,
    /// CPU utilisation as a percentage of one core.
    pub cpu_usage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxResult {
    pub success: bool,
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub metrics: SandboxMetrics,
}

/// One component test case. Output comparison happens on the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTest {
    pub input: Value,
    pub expected_output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub passed: bool,
    #[serde(default)]
    pub actual_output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub success: bool,
    pub results: Vec<TestCaseResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValidation {
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sandbox_id_is_a_plain_string_on_the_wire() {
        let id = SandboxId::new("sbx-1");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("sbx-1"));
        assert_eq!(id.to_string(), "sbx-1");
    }

    #[test]
    fn sandbox_result_tolerates_missing_metrics() {
        let result: SandboxResult =
            serde_json::from_value(json!({"success": false, "error": "node n2 threw"})).unwrap();
        assert!(!result.success);
        assert!(result.output.is_null());
        assert_eq!(result.error.as_deref(), Some("node n2 threw"));
        assert_eq!(result.metrics, SandboxMetrics::default());
    }

    #[test]
    fn component_test_uses_camel_case() {
        let test = ComponentTest {
            input: json!({"a": 1}),
            expected_output: json!(2),
            timeout_ms: Some(500),
        };
        let value = serde_json::to_value(&test).unwrap();
        assert_eq!(value["expectedOutput"], 2);
        assert_eq!(value["timeoutMs"], 500);
    }

    #[test]
    fn input_validation_parses_is_valid() {
        let v: InputValidation =
            serde_json::from_value(json!({"isValid": false, "errors": ["a is required"]})).unwrap();
        assert!(!v.is_valid);
        assert_eq!(v.errors, ["a is required"]);
    }
}
