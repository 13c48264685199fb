// Stride agent loop
// Main entry point for the stride binary

use clap::Parser;
use stride_engine::cli::Cli;
use stride_engine::config::Config;
use stride_engine::handlers::{handle_run, OutputFormat};
use stride_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up OPENAI_API_KEY, AOC_SESSION etc. from a local .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let mut config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };
    config.apply_env_overrides(|key| std::env::var(key).ok())?;

    // CLI flags win over file and environment
    if let Some(level) = &cli.log {
        config.core.log_level = level.to_lowercase();
    }
    if let Some(steps) = cli.max_steps {
        config.core.max_steps = steps;
    }
    config.validate()?;

    // Only takes effect if RUST_LOG env var is not set
    init_telemetry_with_level(&config.core.log_level);

    tracing::info!("Stride v{}", env!("CARGO_PKG_VERSION"));

    handle_run(cli.goal_text(), &config, format, !cli.no_review).await
}
