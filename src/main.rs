//! Ghostflow - privacy-preserving workflow observation and execution.
//!
//! Main entry point for the Ghostflow server CLI.

mod cli;
mod config;
mod server;

use clap::Parser;
use tracing::{info, warn};

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    server::init_tracing();

    let cli = Cli::parse();

    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        warn!("Failed to load config from {:?}: {}, using defaults", cli.config, e);
        Config::default()
    });
    info!(
        "Configuration loaded: server={}:{}",
        config.server.host, config.server.port
    );

    match cli.command {
        None => server::run_server(config).await,
        Some(Commands::Run { host, port }) => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::run_server(config).await
        }
        Some(Commands::Schema) => {
            println!("{}", ghostflow_store::schema::SCHEMA);
            Ok(())
        }
    }
}
