/// Raised by a rule that cannot evaluate the graph it was given.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RuleFault(pub String);

impl RuleFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A rule faulted mid-validation. The whole pass is aborted.
#[derive(Debug, thiserror::Error)]
#[error("rule `{rule_id}` failed to evaluate: {source}")]
pub struct RuleEvaluationFault {
    pub rule_id: String,
    #[source]
    pub source: RuleFault,
}

pub type Result<T> = std::result::Result<T, RuleEvaluationFault>;
