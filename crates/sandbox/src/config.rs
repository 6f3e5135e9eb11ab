use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub(crate) const DEFAULT_MAX_MEMORY_MB: u32 = 512;
pub(crate) const DEFAULT_MAX_CPU_PERCENT: u8 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        }
    }
}

/// Resource ceilings requested for one sandbox.
///
/// camelCase on the wire; snake_case is also accepted for config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SandboxConfig {
    #[serde(alias = "timeout_ms")]
    pub timeout_ms: u64,
    #[serde(alias = "max_memory_mb")]
    pub max_memory_mb: u32,
    #[serde(alias = "max_cpu_percent")]
    pub max_cpu_percent: u8,
    pub environment: Environment,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_memory_mb: DEFAULT_MAX_MEMORY_MB,
            max_cpu_percent: DEFAULT_MAX_CPU_PERCENT,
            environment: Environment::default(),
        }
    }
}

impl SandboxConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(SessionError::InvalidConfig("timeout_ms must be positive".into()));
        }
        if self.max_memory_mb == 0 {
            return Err(SessionError::InvalidConfig(
                "max_memory_mb must be positive".into(),
            ));
        }
        if !(1..=100).contains(&self.max_cpu_percent) {
            return Err(SessionError::InvalidConfig(format!(
                "max_cpu_percent must be within 1..=100, got {}",
                self.max_cpu_percent
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SandboxConfig::default();
        config.validate().unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn rejects_out_of_range_ceilings() {
        for config in [
            SandboxConfig {
                timeout_ms: 0,
                ..SandboxConfig::default()
            },
            SandboxConfig {
                max_memory_mb: 0,
                ..SandboxConfig::default()
            },
            SandboxConfig {
                max_cpu_percent: 0,
                ..SandboxConfig::default()
            },
            SandboxConfig {
                max_cpu_percent: 101,
                ..SandboxConfig::default()
            },
        ] {
            assert!(matches!(
                config.validate(),
                Err(SessionError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn wire_form_is_camel_case_with_lowercase_environment() {
        let config = SandboxConfig {
            environment: Environment::Production,
            ..SandboxConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["environment"], "production");
        assert_eq!(json["maxCpuPercent"], 50);
        assert_eq!(json["timeoutMs"], 30_000);
        assert!(json.get("max_cpu_percent").is_none());
        assert_eq!(Environment::Production.as_str(), "production");
    }

    #[test]
    fn accepts_both_key_styles() {
        let camel: SandboxConfig =
            serde_json::from_value(serde_json::json!({"maxMemoryMb": 256, "timeoutMs": 5000}))
                .unwrap();
        let snake: SandboxConfig =
            serde_json::from_value(serde_json::json!({"max_memory_mb": 256, "timeout_ms": 5000}))
                .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.max_memory_mb, 256);
        assert_eq!(camel.max_cpu_percent, 50);
    }
}
