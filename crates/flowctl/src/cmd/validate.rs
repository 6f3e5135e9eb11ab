use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;
use tracing::{debug, info};
use workflow::{ValidationError, ValidationReport, WorkflowGraph};

use crate::config;
use crate::error::CliResult;

#[derive(Args)]
pub struct ValidateArgs {
    /// Workflow graph as JSON (`{"nodes": [...], "edges": [...]}`)
    graph: PathBuf,
    /// Path to flowctl.yaml config file
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run_validate(args: ValidateArgs) -> CliResult<ExitCode> {
    let flow_config = config::load_or_default(args.config.as_deref()).await?;
    let graph = load_graph(&args.graph).await?;
    let validator = flow_config.validator();
    debug!(rules = validator.rules().len(), "rules loaded");

    let report = validator.validate(&graph)?;
    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "workflow validated"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }

    Ok(if report.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn load_graph(path: &Path) -> CliResult<WorkflowGraph> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

fn render_finding(label: &str, finding: &ValidationError) -> String {
    match &finding.node_id {
        Some(node_id) => format!("{label} [{}] {node_id}: {}\n", finding.kind, finding.message),
        None => format!("{label} [{}] {}\n", finding.kind, finding.message),
    }
}

fn render_report(report: &ValidationReport) -> String {
    let mut out = String::new();
    for finding in &report.errors {
        out.push_str(&render_finding("error:  ", finding));
    }
    for finding in &report.warnings {
        out.push_str(&render_finding("warning:", finding));
    }
    let verdict = if report.is_valid { "valid" } else { "invalid" };
    out.push_str(&format!(
        "{verdict}: {} error(s), {} warning(s)\n",
        report.errors.len(),
        report.warnings.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use workflow::Rule;

    use super::*;

    async fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    fn graph_json(edges: serde_json::Value) -> String {
        json!({
            "nodes": [
                {"id": "a", "type": "trigger", "position": {"x": 0.0, "y": 0.0}},
                {"id": "b", "type": "http_request", "data": {"url": "https://example.com"}},
            ],
            "edges": edges,
        })
        .to_string()
    }

    #[tokio::test]
    async fn acyclic_graph_passes_default_rules() {
        let dir = tempfile::tempdir().unwrap();
        let graph = write(&dir, "graph.json", &graph_json(json!([{"source": "a", "target": "b"}]))).await;

        let code = run_validate(ValidateArgs {
            graph,
            config: None,
            json: false,
        })
        .await
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[tokio::test]
    async fn cyclic_graph_fails() {
        let dir = tempfile::tempdir().unwrap();
        let edges = json!([
            {"source": "a", "target": "b"},
            {"source": "b", "target": "a"},
        ]);
        let graph = write(&dir, "graph.json", &graph_json(edges)).await;

        let code = run_validate(ValidateArgs {
            graph,
            config: None,
            json: true,
        })
        .await
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn configured_rules_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let graph = write(&dir, "graph.json", &graph_json(json!([{"source": "a", "target": "b"}]))).await;
        let config = write(
            &dir,
            "flowctl.yaml",
            "rules:\n  - kind: required_fields\n    node_type: http_request\n    fields: [url, method]\n",
        )
        .await;

        let code = run_validate(ValidateArgs {
            graph,
            config: Some(config),
            json: false,
        })
        .await
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn malformed_graph_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let graph = write(&dir, "graph.json", "{\"nodes\": [{\"id\": 1}]}").await;

        let err = run_validate(ValidateArgs {
            graph,
            config: None,
            json: false,
        })
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("json error"), "got: {err}");
    }

    #[test]
    fn report_lists_errors_before_warnings() {
        let rules = [
            Rule::new("w", "Warn", "emits a warning", |_, _| {
                Ok(vec![ValidationError::warning("duplicate_edge", "a -> b appears twice")])
            }),
            Rule::new("e", "Err", "emits an error", |_, _| {
                Ok(vec![
                    ValidationError::error("cycle", "node `a` is part of a cycle").on_node("a"),
                ])
            }),
        ];
        let report = workflow::validate(&[], &[], &rules).unwrap();

        let rendered = render_report(&report);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "error:   [cycle] a: node `a` is part of a cycle");
        assert_eq!(lines[1], "warning: [duplicate_edge] a -> b appears twice");
        assert_eq!(lines[2], "invalid: 1 error(s), 1 warning(s)");
    }

    #[test]
    fn clean_report_is_a_single_verdict_line() {
        let report = workflow::validate(&[], &[], &[]).unwrap();
        assert_eq!(render_report(&report), "valid: 0 error(s), 0 warning(s)\n");
    }
}
