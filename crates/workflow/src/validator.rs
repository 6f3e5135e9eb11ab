use chrono::Utc;
use tracing::debug;

use crate::error::{Result, RuleEvaluationFault};
use crate::finding::{Severity, ValidationReport};
use crate::graph::{Edge, Node, WorkflowGraph};
use crate::rule::Rule;
use crate::spec::{RuleSpec, default_rule_specs};

/// Evaluate `rules` against a graph and bucket the findings by severity.
///
/// A faulting rule aborts the pass; findings from other rules are not
/// returned in that case.
pub fn validate(nodes: &[Node], edges: &[Edge], rules: &[Rule]) -> Result<ValidationReport> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut info = 0usize;

    for rule in rules {
        let findings = rule
            .evaluate(nodes, edges)
            .map_err(|source| RuleEvaluationFault {
                rule_id: rule.id.clone(),
                source,
            })?;
        for finding in findings {
            match finding.severity {
                Severity::Error => errors.push(finding),
                Severity::Warning => warnings.push(finding),
                Severity::Info => info += 1,
            }
        }
    }

    debug!(
        rules = rules.len(),
        errors = errors.len(),
        warnings = warnings.len(),
        info,
        "workflow validated"
    );

    Ok(ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        timestamp: Utc::now(),
    })
}

/// A fixed rule set applied to whole graphs.
#[derive(Debug)]
pub struct WorkflowValidator {
    rules: Vec<Rule>,
}

impl WorkflowValidator {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn from_specs(specs: &[RuleSpec]) -> Self {
        Self::new(specs.iter().map(RuleSpec::build).collect())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn validate(&self, graph: &WorkflowGraph) -> Result<ValidationReport> {
        validate(&graph.nodes, &graph.edges, &self.rules)
    }
}

impl Default for WorkflowValidator {
    fn default() -> Self {
        Self::from_specs(&default_rule_specs())
    }
}
