//! Packet CLI - manage Packet bare metal devices.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use packet::cli::{Cli, Commands};
use packet::config::{Config, ConfigFile};
use packet::output;
use packet::providers::packet::Packet;
use packet::router::Router;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::new(
        ConfigFile::load(cli.config.as_deref()).context("Failed to load configuration")?,
    );

    let Commands::Baremetal { command } = cli.command;
    let command = command.into_device_command(&config)?;

    let api_key = config.api_key(cli.api_key.as_deref())?;
    let provider = Packet::with_base_url(api_key, &config.api_url(cli.api_url.as_deref()))
        .context("Failed to create Packet client")?;

    let outcome = Router::new(&provider).dispatch(command).await?;

    if cli.json {
        println!("{}", output::render_json(&outcome)?);
    } else {
        println!("{}", output::render_text(&outcome));
    }

    Ok(())
}
