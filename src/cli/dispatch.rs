use anyhow::Result;

use super::commands::Commands;
use super::config::cmd_config;
use super::context::CliContext;
use super::env::CliArgs;
use super::rehearse::cmd_rehearse;
use super::step::cmd_step;
use super::timing::cmd_timing;
use super::vars::cmd_vars;
use super::workflow::cmd_workflow;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Workflow(args) => cmd_workflow(args, ctx).await,
        Commands::Step(args) => cmd_step(args, ctx).await,
        Commands::Vars(args) => cmd_vars(args),
        Commands::Timing(args) => cmd_timing(args, ctx.config()),
        Commands::Rehearse(args) => cmd_rehearse(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx),
    }
}
