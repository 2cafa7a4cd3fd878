//! Command-line interface for strictly_arena.

use clap::{Parser, Subcommand};
use strictly_arena::PolicyKind;

/// Strictly Arena - tic-tac-toe session server with live observers
#[derive(Parser, Debug)]
#[command(name = "strictly_arena")]
#[command(about = "Multiplayer tic-tac-toe session server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP/WebSocket session server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Host to bind to (overrides config and environment)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config and environment)
        #[arg(short, long)]
        port: Option<u16>,

        /// Policy for the automated seat
        #[arg(long, value_enum)]
        policy: Option<PolicyKind>,
    },
}
