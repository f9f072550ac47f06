// Waypoint travel mission orchestrator
// Main entry point for the waypoint binary

use clap::Parser;
use sdk::errors::{EngineError, WaypointErrorExt};
use waypoint_engine::cli::{Cli, Command, ConfigAction};
use waypoint_engine::config::Config;
use waypoint_engine::handlers::{
    handle_config_path, handle_config_show, handle_run, OutputFormat,
};
use waypoint_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = &result {
        if let Some(engine_error) = e.downcast_ref::<EngineError>() {
            eprintln!("Hint: {}", engine_error.user_hint());
        }
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // `config path` must work even when the file is broken
    if let Command::Config {
        action: ConfigAction::Path,
    } = &cli.command
    {
        return handle_config_path(cli.config.as_deref(), format);
    }

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");
    tracing::debug!("Waypoint v{} ({} - {})", version, commit, timestamp);

    match cli.command {
        Command::Run { goal } => handle_run(goal, &config, format).await,

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(cli.config.as_deref(), format),
        },
    }
}
