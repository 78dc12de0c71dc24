//! Library entrypoint for vitrine-server so tests and other binaries can
//! reuse the router without spawning the binary.

pub mod auth;
pub mod cli;
pub mod config;
pub mod contact;
pub mod health;
pub mod render;
pub mod server;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

pub fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Run the server using CLI args (parsed by the caller).
pub async fn run_with_cli(cli: cli::Cli) -> Result<()> {
    init_tracing(cli.verbose)?;
    let config = config::ServerConfig::from_cli(&cli)?;
    server::serve(config).await
}
