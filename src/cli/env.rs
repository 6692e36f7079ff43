use std::path::PathBuf;

use clap::Parser;

use super::commands::Commands;

#[derive(Parser, Clone)]
#[command(name = "retrace", version, about = "Record and replay browser workflows")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}
