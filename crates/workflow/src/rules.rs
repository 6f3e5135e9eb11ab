//! Built-in rules.

use std::collections::{HashMap, HashSet, VecDeque};

use serde_json::Value;

use crate::finding::{Severity, ValidationError};
use crate::graph::Edge;
use crate::rule::Rule;

fn successors(edges: &[Edge]) -> HashMap<&str, Vec<&str>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }
    adjacency
}

/// Whether `start` can reach itself by following at least one edge.
fn on_cycle(start: &str, adjacency: &HashMap<&str, Vec<&str>>) -> bool {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<&str> = adjacency.get(start).into_iter().flatten().copied().collect();
    while let Some(current) = queue.pop_front() {
        if current == start {
            return true;
        }
        if seen.insert(current) {
            queue.extend(adjacency.get(current).into_iter().flatten().copied());
        }
    }
    false
}

impl Rule {
    pub fn no_cycles() -> Self {
        Rule::new(
            "no_cycles",
            "No cycles",
            "Workflows execute as a DAG; every node on a cycle is reported.",
            |nodes, edges| {
                let adjacency = successors(edges);
                Ok(nodes
                    .iter()
                    .filter(|node| on_cycle(&node.id, &adjacency))
                    .map(|node| {
                        ValidationError::error("cycle", format!("node `{}` is part of a cycle", node.id))
                            .on_node(&node.id)
                    })
                    .collect())
            },
        )
    }

    pub fn disconnected_nodes() -> Self {
        Rule::new(
            "disconnected_nodes",
            "Disconnected nodes",
            "Nodes without any incoming or outgoing edge never run.",
            |nodes, edges| {
                if nodes.len() < 2 {
                    return Ok(Vec::new());
                }
                let linked: HashSet<&str> = edges
                    .iter()
                    .flat_map(|e| [e.source.as_str(), e.target.as_str()])
                    .collect();
                Ok(nodes
                    .iter()
                    .filter(|node| !linked.contains(node.id.as_str()))
                    .map(|node| {
                        ValidationError::warning(
                            "disconnected_node",
                            format!("node `{}` is not connected to the workflow", node.id),
                        )
                        .on_node(&node.id)
                    })
                    .collect())
            },
        )
    }

    pub fn duplicate_edges() -> Self {
        Rule::new(
            "duplicate_edges",
            "Duplicate edges",
            "The same source and target should be connected at most once.",
            |_, edges| {
                let mut order: Vec<(&str, &str)> = Vec::new();
                let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
                for edge in edges {
                    let pair = (edge.source.as_str(), edge.target.as_str());
                    let count = counts.entry(pair).or_insert(0);
                    if *count == 0 {
                        order.push(pair);
                    }
                    *count += 1;
                }
                Ok(order
                    .into_iter()
                    .filter_map(|pair| counts.get(&pair).map(|&count| (pair, count)))
                    .filter(|&(_, count)| count > 1)
                    .map(|((source, target), count)| {
                        ValidationError::warning(
                            "duplicate_edge",
                            format!("{source} -> {target} is connected {count} times"),
                        )
                        .on_node(source)
                        .with_detail("source", source)
                        .with_detail("target", target)
                        .with_detail("count", count)
                    })
                    .collect())
            },
        )
    }

    /// Every node with no incoming edge is an entry point; a non-empty graph needs one.
    pub fn entry_node() -> Self {
        Rule::new(
            "entry_node",
            "Entry node",
            "A workflow needs at least one node without incoming edges to start from.",
            |nodes, edges| {
                if nodes.is_empty() {
                    return Ok(Vec::new());
                }
                let targets: HashSet<&str> = edges.iter().map(|e| e.target.as_str()).collect();
                if nodes.iter().any(|n| !targets.contains(n.id.as_str())) {
                    return Ok(Vec::new());
                }
                Ok(vec![ValidationError::error(
                    "no_entry_node",
                    "every node has an incoming edge; the workflow has no starting point",
                )])
            },
        )
    }

    /// Nodes of `node_type` must carry each of `fields` as a non-null payload entry.
    pub fn required_fields(node_type: impl Into<String>, fields: Vec<String>) -> Self {
        let node_type = node_type.into();
        Rule::new(
            format!("required_fields:{node_type}"),
            format!("Required {node_type} fields"),
            format!("{node_type} nodes must set: {}", fields.join(", ")),
            move |nodes, _| {
                let mut findings = Vec::new();
                for node in nodes.iter().filter(|n| n.node_type == node_type) {
                    for field in &fields {
                        let present = node
                            .data
                            .get(field)
                            .is_some_and(|v| !matches!(v, Value::Null));
                        if !present {
                            findings.push(
                                ValidationError::error(
                                    "missing_field",
                                    format!("node `{}` is missing required field `{field}`", node.id),
                                )
                                .on_node(&node.id)
                                .with_detail("field", field.as_str()),
                            );
                        }
                    }
                }
                Ok(findings)
            },
        )
    }

    pub fn max_nodes(limit: usize, severity: Severity) -> Self {
        Rule::new(
            "max_nodes",
            "Maximum node count",
            format!("Workflows should have at most {limit} nodes."),
            move |nodes, _| {
                if nodes.len() <= limit {
                    return Ok(Vec::new());
                }
                Ok(vec![
                    ValidationError::new(
                        severity,
                        "too_many_nodes",
                        format!("workflow has {} nodes, limit is {limit}", nodes.len()),
                    )
                    .with_detail("count", nodes.len())
                    .with_detail("limit", limit),
                ])
            },
        )
    }
}
