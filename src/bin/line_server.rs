//! Index a text file and serve its lines over HTTP

use anyhow::{Context, Result};
use clap::Parser;
use line_server::{config::Config, server, LineStore};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    // The server is only started once the whole file is indexed
    let store = LineStore::build_with(&config.file, config.strategy)
        .await
        .with_context(|| format!("failed to index '{}'", config.file.display()))?;

    server::run(&config, store)
        .await
        .context("server terminated with an error")?;

    Ok(())
}
