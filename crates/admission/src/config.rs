use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AdmissionError, Result};

/// Share of `max_requests` granted as burst allowance when none is configured.
const DEFAULT_BURST_DIVISOR: u32 = 5;

/// Steady capacity, window length and optional burst allowance for one
/// [`AdmissionController`](crate::AdmissionController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub max_requests: u32,
    pub time_window_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_size: Option<u32>,
}

impl RateLimit {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            time_window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
            burst_size: None,
        }
    }

    pub fn with_burst(mut self, burst_size: u32) -> Self {
        self.burst_size = Some(burst_size);
        self
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.time_window_ms)
    }

    /// Burst capacity in effect: the configured value, or 20% of `max_requests`.
    pub fn effective_burst(&self) -> u32 {
        self.burst_size
            .unwrap_or(self.max_requests / DEFAULT_BURST_DIVISOR)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_requests == 0 {
            return Err(AdmissionError::InvalidConfig(
                "max_requests must be positive".into(),
            ));
        }
        if self.time_window_ms == 0 {
            return Err(AdmissionError::InvalidConfig(
                "time_window_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}
