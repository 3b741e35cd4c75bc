#![forbid(unsafe_code)]

mod cli;
mod commands;
mod output;

use clap::Parser;
use compliancehub_client::ClientError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Exit status when the stored session is missing or no longer valid.
const EXIT_LOGIN_REQUIRED: u8 = 2;

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// The message shown for a failed command and the exit status.
fn failure(err: &anyhow::Error) -> (String, u8) {
    match err.downcast_ref::<ClientError>() {
        Some(e) if e.requires_login() => (
            "Session expired. Run `chub login`.".to_string(),
            EXIT_LOGIN_REQUIRED,
        ),
        Some(e) => (e.user_message(), 1),
        None => (format!("{:#}", err), 1),
    }
}

fn report(err: &anyhow::Error, json: bool) -> ExitCode {
    let (message, code) = failure(err);
    if json {
        println!(
            "{}",
            serde_json::json!({ "ok": false, "error": message })
        );
    } else {
        eprintln!("error: {}", message);
    }
    ExitCode::from(code)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json = cli.json;

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "Command failed");
            report(&err, json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn test_login_required_errors_share_hint_and_status() {
        for err in [ClientError::NotAuthenticated, ClientError::SessionExpired] {
            let (message, code) = failure(&anyhow::Error::from(err));
            assert_eq!(message, "Session expired. Run `chub login`.");
            assert_eq!(code, EXIT_LOGIN_REQUIRED);
        }
    }

    #[test]
    fn test_other_errors_exit_one() {
        let err = anyhow::Error::from(ClientError::NotFound("Evidence not found".into()));
        assert_eq!(failure(&err), ("Evidence not found".to_string(), 1));

        let err = Err::<(), _>(std::io::Error::other("disk full"))
            .context("failed to write report.pdf")
            .unwrap_err();
        assert_eq!(failure(&err), ("failed to write report.pdf: disk full".to_string(), 1));
    }
}
