//! witsweep - list and close Azure DevOps work items assigned to a user.

use std::process::ExitCode;

use clap::Parser;

use witsweep::cli::Cli;
use witsweep::{app, logging};

fn main() -> anyhow::Result<ExitCode> {
    // .env must be loaded before clap reads env-backed arguments.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("warning: file logging disabled: {}", e);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let code = match runtime.block_on(app::run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("{}", action);
            }
            ExitCode::FAILURE
        }
    };

    tracing::info!("witsweep shutting down");
    Ok(code)
}
