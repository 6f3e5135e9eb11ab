use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use tracing::info;

use crate::config::{self, FlowConfig};
use crate::error::CliResult;

#[derive(Args)]
pub struct CheckConfigArgs {
    /// Path to flowctl.yaml config file
    config: PathBuf,
}

pub async fn run_check_config(args: CheckConfigArgs) -> CliResult<ExitCode> {
    let flow_config = config::load(&args.config).await?;
    info!(path = %args.config.display(), "config is valid");
    print!("{}", describe(&flow_config));
    Ok(ExitCode::SUCCESS)
}

/// Effective values, with defaults filled in.
fn describe(config: &FlowConfig) -> String {
    let limit = &config.rate_limit;
    let sandbox = &config.sandbox;
    let mut out = format!(
        "rate_limit:\n  \
         max_requests: {}\n  \
         time_window_ms: {}\n  \
         burst_size: {}\n\
         sandbox:\n  \
         timeout_ms: {}\n  \
         max_memory_mb: {}\n  \
         max_cpu_percent: {}\n  \
         environment: {}\n\
         rules:\n",
        limit.max_requests,
        limit.time_window_ms,
        limit.effective_burst(),
        sandbox.timeout_ms,
        sandbox.max_memory_mb,
        sandbox.max_cpu_percent,
        sandbox.environment.as_str(),
    );
    for rule in config.validator().rules() {
        out.push_str(&format!("  - {}: {}\n", rule.id, rule.description));
    }
    out
}
