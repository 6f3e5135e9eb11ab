use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use admission::{AdmissionController, ManualClock, RateLimit};
use clap::Args;
use tracing::info;

use crate::config;
use crate::error::CliResult;

#[derive(Args)]
pub struct SimulateArgs {
    /// Path to flowctl.yaml config file
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Admission key to replay requests under
    #[arg(long, default_value = "default")]
    key: String,
    /// Number of requests to replay
    #[arg(long, default_value_t = 10)]
    requests: u32,
    /// Simulated delay between consecutive requests
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,
}

/// Outcome of one replayed request.
#[derive(Debug, Clone, PartialEq)]
struct Decision {
    at: Duration,
    admitted: bool,
    remaining_requests: u32,
    remaining_burst: u32,
    /// Time until the window rolls over, for rejected requests.
    retry_after: Option<Duration>,
}

/// Replay `requests` checks for `key`, `interval` apart, on a hand-driven clock.
fn simulate(limit: &RateLimit, key: &str, requests: u32, interval: Duration) -> CliResult<Vec<Decision>> {
    let clock = ManualClock::new();
    let mut controller = AdmissionController::with_clock(limit.clone(), clock.clone())?;
    let mut decisions = Vec::new();

    for n in 0..requests {
        if n > 0 {
            clock.advance(interval);
        }
        let admitted = controller.check_limit(key);
        let retry_after = (!admitted).then(|| controller.time_until_reset(key));
        decisions.push(Decision {
            at: clock.elapsed(),
            admitted,
            remaining_requests: controller.remaining_requests(key),
            remaining_burst: controller.remaining_burst(key),
            retry_after,
        });
    }
    Ok(decisions)
}

pub async fn run_simulate(args: SimulateArgs) -> CliResult<ExitCode> {
    let flow_config = config::load_or_default(args.config.as_deref()).await?;
    let limit = &flow_config.rate_limit;
    info!(
        max_requests = limit.max_requests,
        window_ms = limit.time_window_ms,
        burst_size = limit.effective_burst(),
        key = %args.key,
        "simulating admission"
    );

    let decisions = simulate(
        limit,
        &args.key,
        args.requests,
        Duration::from_millis(args.interval_ms),
    )?;

    for (i, d) in decisions.iter().enumerate() {
        let verdict = if d.admitted { "admit " } else { "reject" };
        let retry = d
            .retry_after
            .map(|r| format!(" retry_in={}ms", r.as_millis()))
            .unwrap_or_default();
        println!(
            "#{:<4} t={:>6}ms {verdict} remaining={} burst={}{retry}",
            i + 1,
            d.at.as_millis(),
            d.remaining_requests,
            d.remaining_burst,
        );
    }
    let admitted = decisions.iter().filter(|d| d.admitted).count();
    println!(
        "{admitted} admitted, {} rejected",
        decisions.len() - admitted
    );
    Ok(ExitCode::SUCCESS)
}
