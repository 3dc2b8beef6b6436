//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

/// CallScribe - call event relay and transcription service
#[derive(Parser, Debug)]
#[command(name = "call-scribe")]
#[command(version)]
#[command(about = "Relay call events downstream and transcribe call recordings")]
#[command(long_about = None)]
pub struct Cli {
    /// Config file path (defaults to the XDG location)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Listen address (e.g. 0.0.0.0:8080)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// List the effective config values
    List,
    /// Show config file path
    Path,
}
