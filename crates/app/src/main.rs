//! Till register CLI

#![expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "command output and fatal errors are written to the terminal"
)]

use std::process;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use till_app::observability;

use crate::cli::Cli;

mod cli;

#[tokio::main]
pub async fn main() {
    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(error) => error.exit(),
    };

    if let Err(error) = observability::init(&cli.config().logging) {
        eprintln!("{error}");
        process::exit(1);
    }

    let cancel = CancellationToken::new();

    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    if let Err(error) = cli.run(cancel).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

/// Cancels in-flight backend calls when the operator presses Ctrl+C.
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            warn!("interrupted; cancelling pending requests");
            cancel.cancel();
        }
        Err(source) => error!("failed to install Ctrl+C handler: {source}"),
    }
}
