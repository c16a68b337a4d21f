use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quay_audit::registry::{self, QUAY_IO_ENDPOINT, RegistryClient, RegistryConfig};
use quay_audit::types::State;
use quay_audit::{analyzer, formatters, snapshot};

use super::{Args, EXIT_CLEAN, EXIT_FINDINGS};

pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn acquire_state(args: &Args, token: Option<String>) -> Result<State> {
    if let Some(ref path) = args.from_state {
        if args.api_root.is_some() {
            warn!("--api-root is ignored when --from-state is given");
        }
        return Ok(snapshot::load(path)?);
    }

    let config = RegistryConfig {
        api_root: args
            .api_root
            .clone()
            .unwrap_or_else(|| QUAY_IO_ENDPOINT.to_string()),
        token,
        timeout: Duration::from_secs(args.timeout),
    };
    let client = RegistryClient::new(config)?;
    registry::fetch_state(&client, &args.namespace, args.progress)
        .with_context(|| format!("fetch state for {}", args.namespace))
}

pub fn run_with_args(args: &Args, token: Option<String>) -> Result<ExitCode> {
    let state = acquire_state(args, token)?;

    if state.organization.namespace != args.namespace {
        warn!(
            requested = %args.namespace,
            snapshot = %state.organization.namespace,
            "state belongs to a different namespace"
        );
    }

    // Dump before analysis so the file always holds the unfiltered state.
    if let Some(ref path) = args.dump_state {
        snapshot::dump(&state, path)?;
    }

    let findings = analyzer::find_external_access(&state);
    info!(
        repositories = state.repositories.len(),
        findings = findings.len(),
        "analysis complete"
    );

    if args.json {
        let s = formatters::json::format(&state.organization.namespace, &findings)?;
        println!("{s}");
    } else {
        print!("{}", formatters::text::format(&findings));
    }

    Ok(if findings.is_empty() {
        ExitCode::from(EXIT_CLEAN)
    } else {
        ExitCode::from(EXIT_FINDINGS)
    })
}
