//! vitrine-server: the brand-group marketing site with inline admin
//! editing over a remote document store.

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = vitrine_server::cli::Cli::parse();
    vitrine_server::run_with_cli(cli).await
}
