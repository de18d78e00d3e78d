// STEM Tutor
// Main entry point for the tutor binary

use clap::Parser;
use tutor_engine::cli::{Cli, Command, ConfigAction, SecretAction};
use tutor_engine::config::Config;
use tutor_engine::handlers::{
    handle_ask, handle_config_show, handle_config_validate, handle_doctor, handle_ingest,
    handle_report, handle_secret_set, handle_session, OutputFormat,
};
use tutor_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Pick up API keys from a local .env before anything reads the environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env file: {}", e);
        }
    }

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the config file; RUST_LOG wins over both
    init_telemetry_with_level(cli.log.as_deref().unwrap_or(&config.core.log_level));

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("STEM Tutor v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Handle commands
    match cli.command {
        Command::Ask { question, practice } => {
            handle_ask(question, practice, &config, format).await
        }

        Command::Session => handle_session(&config, format).await,

        Command::Ingest {
            subject,
            file,
            builtin,
        } => {
            tracing::info!("Ingesting reference problems");
            handle_ingest(subject, file, builtin, &config, format).await
        }

        Command::Report { output } => handle_report(output, format).await,

        Command::Secret { action } => match action {
            SecretAction::Set { provider, value } => {
                handle_secret_set(provider, value, format).await
            }
        },

        Command::Config { action } => {
            tracing::info!("Config management: {:?}", action);
            match action {
                ConfigAction::Show => handle_config_show(&config, format),
                ConfigAction::Validate => handle_config_validate(&config, format),
            }
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, format).await
        }
    }
}
