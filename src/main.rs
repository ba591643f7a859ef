use std::process::ExitCode;

use bazaar_rs::cli::{Cli, execute_command, init_logger_from_settings, load_settings};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (settings, environment) = match load_settings(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logger_from_settings(&settings) {
        eprintln!("Logger initialization error: {e:#}");
        return ExitCode::FAILURE;
    }

    tracing::debug!(
        environment = environment.as_str(),
        backend = settings.database.backend.as_str(),
        "Configuration loaded"
    );

    match execute_command(&cli, settings, environment).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
