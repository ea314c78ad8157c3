//! PDF page extraction server - Entry point

mod cli;

use clap::Parser;
use cli::Cli;
use pdf_extract_server::run_server_with_config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the MCP transport
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_extract_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.into_config();
    tracing::info!(
        upload_dir = %config.upload_dir.display(),
        in_memory = config.in_memory,
        accounts = config.accounts.len(),
        "Starting PDF extraction server"
    );

    run_server_with_config(config).await
}
