//! beatmanager - manage a local library of rhythm-game songs and playlists.
//!
//! Every command prints its result to stdout as pretty JSON. Failures are
//! written to stderr as a JSON error object and exit with a non-zero status.

mod cli;
mod commands;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

use cli::Cli;
use commands::{AppState, map_err, resolve_config};
use logging::LoggingConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _logging_guard = match logging::init(&LoggingConfig::for_verbosity(cli.verbose)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("beatmanager: logging disabled: {e}");
            None
        }
    };

    info!("Starting beatmanager {}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(rendered) => {
                println!("{rendered}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                warn!("Failed to render output: {}", e);
                eprintln!("{}", map_err(e.into()));
                ExitCode::FAILURE
            }
        },
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> std::result::Result<Value, String> {
    let config = resolve_config(cli.base_dir, cli.config.as_deref(), cli.collision_policy)
        .map_err(map_err)?;
    let state = AppState::new(config).map_err(map_err)?;
    commands::execute(&state, cli.command).await
}
