use std::fmt;

use crate::error::RuleFault;
use crate::finding::ValidationError;
use crate::graph::{Edge, Node};

type CheckFn =
    dyn Fn(&[Node], &[Edge]) -> Result<Vec<ValidationError>, RuleFault> + Send + Sync;

/// A named, pure check over a workflow graph.
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    check: Box<CheckFn>,
}

impl Rule {
    pub fn new<F>(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        check: F,
    ) -> Self
    where
        F: Fn(&[Node], &[Edge]) -> Result<Vec<ValidationError>, RuleFault> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            check: Box::new(check),
        }
    }

    pub fn evaluate(&self, nodes: &[Node], edges: &[Edge]) -> Result<Vec<ValidationError>, RuleFault> {
        (self.check)(nodes, edges)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
