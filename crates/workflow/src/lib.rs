//! Workflow graph model and rule-based validation.
//!
//! Rules are pure functions over `(nodes, edges)`. A validation pass unions
//! every rule's findings and is invalid iff any finding has error severity.

mod error;
mod finding;
mod graph;
mod rule;
mod rules;
mod spec;
mod validator;

pub use error::{Result, RuleEvaluationFault, RuleFault};
pub use finding::{Severity, ValidationError, ValidationReport};
pub use graph::{Edge, Node, Position, WorkflowGraph};
pub use rule::Rule;
pub use spec::{RuleSpec, default_rule_specs};
pub use validator::{WorkflowValidator, validate};
