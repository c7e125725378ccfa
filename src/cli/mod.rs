//! CLI module for yakulint
//!
//! Command-line interface definitions and handlers for the yakulint
//! compliance-check server.
//!
//! # Commands
//!
//! - `serve` - Start the check server
//! - `config` - Configuration utilities (init)
//!
//! # Example
//!
//! ```bash
//! # Start server with default config
//! yakulint serve
//!
//! # Start with a local LM Studio backend
//! yakulint serve -c lmstudio.toml
//!
//! # Write an example configuration file
//! yakulint config init -o yakulint.toml
//! ```

pub mod config;
pub mod serve;

pub use config::handle_config_init;
pub use serve::run_serve;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// yakulint - 薬機法 compliance check server
#[derive(Parser, Debug)]
#[command(
    name = "yakulint",
    version,
    about = "Asynchronous 薬機法 compliance checks for Japanese marketing copy"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the yakulint server
    Serve(ServeArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "yakulint.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "YAKULINT_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "YAKULINT_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "YAKULINT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Use the in-process mock provider instead of real backends
    #[arg(long)]
    pub mock_provider: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "yakulint.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}
