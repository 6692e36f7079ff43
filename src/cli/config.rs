use anyhow::Result;
use clap::{Args, Subcommand};

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration, overrides applied
    Show,

    /// Print the config file location
    Path,
}

pub fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            println!("# source: {}", ctx.config_path().display());
            print!("{}", serde_yaml::to_string(ctx.config())?);
        }
        ConfigAction::Path => {
            println!("{}", ctx.config_path().display());
        }
    }
    Ok(())
}
