use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("invalid rate limit configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "rate limit exceeded for {key}: retry in {}ms, {remaining} requests remaining",
        retry_after.as_millis()
    )]
    RateLimitExceeded {
        key: String,
        retry_after: Duration,
        remaining: u32,
    },
}

pub type Result<T> = std::result::Result<T, AdmissionError>;
