use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    pub action: WorkflowAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum WorkflowAction {
    /// Create an empty workflow and print its id
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// List workflows, most recently updated first
    List {
        #[arg(long)]
        json: bool,
    },
}

pub async fn cmd_workflow(args: WorkflowArgs, ctx: &CliContext) -> Result<()> {
    let store = ctx.store();
    match args.action {
        WorkflowAction::Create { name, description } => {
            let workflow = store
                .create_workflow(&name, description)
                .await
                .context("Failed to create workflow")?;
            info!(workflow_id = %workflow.id, "created workflow");
            println!("{}", workflow.id);
        }
        WorkflowAction::List { json } => {
            let workflows = store
                .list_workflows()
                .await
                .context("Failed to list workflows")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&workflows)?);
            } else if workflows.is_empty() {
                println!("No workflows found");
            } else {
                for workflow in workflows {
                    println!(
                        "{}  {}  (updated {})",
                        workflow.id,
                        workflow.name,
                        workflow.updated_at.format("%Y-%m-%d %H:%M:%S")
                    );
                    if let Some(description) = workflow.description {
                        println!("    {}", description);
                    }
                }
            }
        }
    }
    Ok(())
}
