#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error("validation aborted: {0}")]
    Validation(#[from] workflow::RuleEvaluationFault),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("admission error: {0}")]
    Admission(#[from] admission::AdmissionError),
}

pub type CliResult<T> = Result<T, CliError>;
