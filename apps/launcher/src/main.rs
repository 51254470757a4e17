//! Open Games Launcher entry point.

mod app;
mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    // Configuration comes first so its log filter can apply.
    let config = config::Config::load(args.config.as_deref())?;

    // Initialize structured logging. Logs go to stderr; stdout is for results.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        catalog = %config.catalog_dir,
        "starting Open Games Launcher"
    );

    let command = args.command.unwrap_or(cli::Command::List);

    // Build and run the tokio runtime.
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config, command))?;

    Ok(())
}
