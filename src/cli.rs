//! CLI definitions for Ghostflow.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ghostflow CLI.
#[derive(Parser)]
#[command(name = "ghostflow")]
#[command(about = "Privacy-preserving workflow observation, mining, and execution")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the server in foreground (default)
    Run {
        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the reference SQL schema and exit
    Schema,
}
