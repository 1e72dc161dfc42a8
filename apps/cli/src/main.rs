use std::env;

use clap::Parser;
use color_eyre::Result;
use painel_cli::cli::{CliArgs, Command};
use painel_cli::commands;
use painel_cli::config::{init_app_config, log_filter};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_filter(
            args.debug,
            env::var("RUST_LOG").ok(),
        )))
        .with_writer(std::io::stderr)
        .init();

    let config = init_app_config(&args);
    tracing::debug!(base_url = %config.base_url, "resolved backend");

    // Everything in the core is single-threaded.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match args.command {
            Command::Summary { json } => commands::summary(config, json).await,
            Command::Check => commands::check(config).await,
            Command::Render { uf, objeto } => commands::render(config, uf, objeto).await,
        }
    })
}
