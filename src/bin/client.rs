//! `client <host> <port> <path> [path ...]`
//!
//! Fetches every path over one HTTP/2 connection and writes each body to
//! its own file.

use std::process::ExitCode;

use h2fetch::{ClientConfig, Error};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(Error::Usage(message)) => {
            eprintln!("{}", message);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let default_level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match h2fetch::client::run(&config).await {
        Ok(summary) => {
            let failed = summary
                .iter()
                .filter(|s| s.response_status.as_deref().map_or(true, |st| !st.starts_with('2')))
                .count();
            info!(streams = summary.len(), failed, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
