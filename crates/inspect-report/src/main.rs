mod cli;
mod config;
mod error;
mod pipeline;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;
use pipeline::PipelineService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env(&cli)?;
    info!(
        report = %config.report_path.display(),
        overrides = ?config.overrides,
        project = config.project_name.as_deref().unwrap_or("*"),
        language = ?config.language,
        validate = config.validate,
        "configuration loaded"
    );

    let output = PipelineService::new(config).run().await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
