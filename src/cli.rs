use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, ValueHint};

mod run_impl;

pub const EXIT_CLEAN: u8 = 0;
pub const EXIT_FINDINGS: u8 = 1;
pub const EXIT_ERROR: u8 = 2;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "quay-audit",
    version,
    about = "Show accounts outside an organization that can access its quay.io repositories",
    long_about = None
)]
pub struct Args {
    /// Namespace to look in
    #[arg(value_name = "NAMESPACE")]
    pub namespace: String,

    /// If provided, get quay.io state from a file, rather than the API
    #[arg(long = "from-state", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub from_state: Option<PathBuf>,

    /// Root of the quay.io API [default: https://quay.io/api/v1].
    /// Ignored if --from-state is provided
    #[arg(
        long = "api-root",
        value_name = "URL",
        env = "QUAY_API_ROOT",
        value_hint = ValueHint::Url
    )]
    pub api_root: Option<String>,

    /// If provided, dump state to a file. Will overwrite the file if it exists
    #[arg(long = "dump-state", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub dump_state: Option<PathBuf>,

    /// Output JSON instead of the text report
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,

    /// Show a progress bar while fetching permissions
    #[arg(long = "progress", action = ArgAction::SetTrue)]
    pub progress: bool,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Verbose logging (-v info, -vv debug)
    #[arg(long = "verbose", short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

/// Runs the CLI application.
///
/// Returns the exit code for a completed audit: [`EXIT_CLEAN`] or [`EXIT_FINDINGS`].
///
/// # Errors
/// Returns an error if state could not be fetched, loaded, or dumped.
pub fn run() -> Result<ExitCode> {
    let args = Args::parse();
    run_impl::init_logging(args.verbose);
    let token = std::env::var(quay_audit::registry::QUAY_TOKEN_ENV_NAME).ok();
    run_impl::run_with_args(&args, token)
}
