//! salesdesk - command-line client for the sales API.
//!
//! Log in once, then list, inspect, create and delete sales. Expired access
//! tokens are refreshed transparently; when the session cannot be recovered
//! the command exits with status 2 and asks for a new login.

mod app;
mod cli;
mod output;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::Cli;

/// Exit status when the session was invalidated and a new login is needed.
const EXIT_LOGIN_REQUIRED: u8 = 2;

/// Initialize the tracing subscriber for logging
fn init_tracing(verbose: bool) {
    // RUST_LOG wins; otherwise warn, or debug with --verbose
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!("salesdesk starting");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut app = App::new(cli.api_url.as_deref())?;
    let outcome = app.run(cli.command).await;

    if app.login_required() {
        eprintln!("Your session has ended. Run `salesdesk login` to sign in again.");
        if let Err(e) = outcome {
            eprintln!("Error: {:#}", e);
        }
        return Ok(ExitCode::from(EXIT_LOGIN_REQUIRED));
    }

    outcome.map(|_| ExitCode::SUCCESS)
}
