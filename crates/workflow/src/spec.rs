use serde::{Deserialize, Serialize};

use crate::finding::Severity;
use crate::rule::Rule;

/// Declarative form of a built-in rule, as written in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSpec {
    NoCycles,
    DisconnectedNodes,
    DuplicateEdges,
    EntryNode,
    RequiredFields {
        node_type: String,
        fields: Vec<String>,
    },
    MaxNodes {
        limit: usize,
        #[serde(default = "default_max_nodes_severity")]
        severity: Severity,
    },
}

fn default_max_nodes_severity() -> Severity {
    Severity::Warning
}

impl RuleSpec {
    pub fn build(&self) -> Rule {
        match self {
            RuleSpec::NoCycles => Rule::no_cycles(),
            RuleSpec::DisconnectedNodes => Rule::disconnected_nodes(),
            RuleSpec::DuplicateEdges => Rule::duplicate_edges(),
            RuleSpec::EntryNode => Rule::entry_node(),
            RuleSpec::RequiredFields { node_type, fields } => {
                Rule::required_fields(node_type.clone(), fields.clone())
            }
            RuleSpec::MaxNodes { limit, severity } => Rule::max_nodes(*limit, *severity),
        }
    }
}

/// Rules applied when a config does not list any.
pub fn default_rule_specs() -> Vec<RuleSpec> {
    vec![
        RuleSpec::NoCycles,
        RuleSpec::EntryNode,
        RuleSpec::DisconnectedNodes,
        RuleSpec::DuplicateEdges,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rule_list_from_yaml() {
        let yaml = r#"
- kind: no_cycles
- kind: required_fields
  node_type: http_request
  fields: [url, method]
- kind: max_nodes
  limit: 50
"#;
        let specs: Vec<RuleSpec> = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0], RuleSpec::NoCycles);
        assert_eq!(
            specs[1],
            RuleSpec::RequiredFields {
                node_type: "http_request".into(),
                fields: vec!["url".into(), "method".into()],
            }
        );
        assert_eq!(
            specs[2],
            RuleSpec::MaxNodes {
                limit: 50,
                severity: Severity::Warning,
            }
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = serde_yaml_ng::from_str::<Vec<RuleSpec>>("- kind: spellcheck\n").unwrap_err();
        assert!(err.to_string().contains("spellcheck"), "got: {err}");
    }

    #[test]
    fn built_rules_keep_their_ids() {
        let ids: Vec<String> = default_rule_specs().iter().map(|s| s.build().id).collect();
        assert_eq!(
            ids,
            ["no_cycles", "entry_node", "disconnected_nodes", "duplicate_edges"]
        );
    }
}
