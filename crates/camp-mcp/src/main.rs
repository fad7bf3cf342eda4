//! camp-bridge MCP Server
//!
//! Usage:
//!   camp-mcp [--index <PATH>] [--account-id <ID>]
//!   camp-mcp --init-config
//!
//! The server communicates over stdio using JSON-RPC 2.0.

use std::path::PathBuf;

use anyhow::{Context, Result};
use camp_api::BasecampClient;
use camp_core::{Config, ConfigError, Paths};
use camp_mcp::{McpServer, Router};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// MCP server for Basecamp card tables, todos and a local project index
#[derive(Parser)]
#[command(name = "camp-mcp")]
#[command(version)]
#[command(after_help = r#"CONFIGURATION:
    Credentials are read from BASECAMP_ACCESS_TOKEN (and optionally
    BASECAMP_ACCOUNT_ID), falling back to ~/.config/camp-bridge/config.json.

    The project index lives at ~/.local/share/camp-bridge/index-cache.json
    unless CAMP_BRIDGE_INDEX or --index says otherwise.

LOGGING:
    Logs go to stderr; set RUST_LOG=debug for request traces.
"#)]
struct Cli {
    /// Project index file
    #[arg(long, value_name = "PATH")]
    index: Option<PathBuf>,

    /// Basecamp account id (skips the /authorization.json lookup)
    #[arg(long, value_name = "ID")]
    account_id: Option<String>,

    /// Write an example config file next to the real one and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = Paths::new();

    if cli.init_config {
        let sample = paths.sample_config_file();
        Config::write_sample(&sample)?;
        eprintln!("Wrote example config to {}", sample.display());
        eprintln!("Fill in accessToken and save it as {}", paths.config_file().display());
        return Ok(());
    }

    let config = match Config::load(&paths) {
        Ok(config) => config,
        Err(e @ ConfigError::MissingCredentials(_)) => {
            eprintln!("{}", e);
            eprintln!("Run `camp-mcp --init-config` for an example config file.");
            return Err(e.into());
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };

    let account_id = cli.account_id.or(config.account_id);
    let index_path = cli.index.unwrap_or_else(|| paths.index_file());

    tracing::info!("Starting camp-bridge MCP server");
    tracing::info!(
        "Account ID: {}",
        account_id.as_deref().unwrap_or("will auto-detect")
    );
    tracing::debug!("Index file: {}", index_path.display());

    let client = BasecampClient::new(config.access_token, account_id);
    let mut server = McpServer::new(Router::new(client, index_path));
    server.run().await?;

    Ok(())
}
