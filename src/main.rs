//! Z.AI search CLI
//!
//! Command-line interface for running web searches

use clap::Parser;
use zai_search::cli::{Cli, Runner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up ZAI_* variables from a local .env, if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);

    // Errors surface as `Error: ...` on stderr with exit code 1
    runner.run().await?;
    Ok(())
}
