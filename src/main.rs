use database::PgPoolFactory;
use std::process::ExitCode;
use webssh::{BootstrapError, args, telemetry};

/// The main entry point for the webssh service.
#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    let _log_guard = match telemetry::init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Accessing command-line arguments...");
    let raw: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let context = match webssh::run(&raw, configuration::load_settings, PgPoolFactory).await {
        Ok(context) => context,
        Err(error) => {
            if let BootstrapError::Argument(_) = error {
                tracing::info!("\n{}", args::usage());
            }
            return ExitCode::from(error.exit_code());
        }
    };

    tracing::info!(
        unit = context.unit().name(),
        session = %context.unit().properties().session_name(),
        "Persistence layer ready; waiting for shutdown signal."
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
    }

    context.shutdown().await;
    ExitCode::SUCCESS
}
