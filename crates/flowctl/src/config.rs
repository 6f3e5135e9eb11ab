use std::path::Path;
use std::time::Duration;

use admission::RateLimit;
use sandbox::SandboxConfig;
use serde::{Deserialize, Serialize};
use workflow::{RuleSpec, WorkflowValidator, default_rule_specs};

use crate::error::{CliError, CliResult};

pub(crate) const DEFAULT_MAX_REQUESTS: u32 = 60;
pub(crate) const DEFAULT_TIME_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub rate_limit: RateLimit,
    pub sandbox: SandboxConfig,
    /// `None` selects the standard rule set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleSpec>>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimit::new(DEFAULT_MAX_REQUESTS, DEFAULT_TIME_WINDOW),
            sandbox: SandboxConfig::default(),
            rules: None,
        }
    }
}

impl FlowConfig {
    pub fn rule_specs(&self) -> Vec<RuleSpec> {
        self.rules.clone().unwrap_or_else(default_rule_specs)
    }

    pub fn validator(&self) -> WorkflowValidator {
        WorkflowValidator::from_specs(&self.rule_specs())
    }

    /// Returns the offending section and cause on failure.
    fn validate(&self) -> Result<(), String> {
        self.rate_limit
            .validate()
            .map_err(|e| format!("rate_limit: {e}"))?;
        self.sandbox.validate().map_err(|e| format!("sandbox: {e}"))?;
        if self.rules.as_ref().is_some_and(Vec::is_empty) {
            return Err("rules: list is empty, omit the section to use the standard rules".into());
        }
        Ok(())
    }
}

/// Load and validate a flowctl config from a YAML file.
pub async fn load(path: &Path) -> CliResult<FlowConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Config(format!("read {}: {e}", path.display())))?;
    let config: FlowConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| CliError::Config(format!("parse {}: {e}", path.display())))?;
    config
        .validate()
        .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;
    Ok(config)
}

/// Load `path` when given, otherwise fall back to built-in defaults.
pub async fn load_or_default(path: Option<&Path>) -> CliResult<FlowConfig> {
    match path {
        Some(path) => load(path).await,
        None => Ok(FlowConfig::default()),
    }
}
