use std::process::ExitCode;

use quay_audit::AuditError;

mod cli;

fn main() -> ExitCode {
    // Errors reach here only before analysis ran; findings are reported through Ok.
    match cli::run() {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<AuditError>() {
                Some(audit) => eprintln!("error: {}: {err:#}", audit.kind()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::from(cli::EXIT_ERROR)
        }
    }
}
