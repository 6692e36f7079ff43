use action_flow::{RecordRequest, RecordTarget, StepRecorder};
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use retrace_core_types::{SelectorSet, StepAction, WorkflowId, WorkflowStep};

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct StepArgs {
    #[command(subcommand)]
    pub action: StepCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum StepCommand {
    /// Insert or replace the step at an order
    Upsert {
        #[arg(long)]
        workflow: String,

        #[arg(long)]
        order: u32,

        /// One of click, type, wait, scroll, nav, hover, extract, screenshot, upload_image
        #[arg(long)]
        action: String,

        #[arg(long)]
        value: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// CSS selector recorded as the step's only strategy
        #[arg(long)]
        selector: Option<String>,
    },

    /// List the steps of a workflow
    List {
        #[arg(long)]
        workflow: String,

        #[arg(long)]
        order: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Remove the step at an order
    Delete {
        #[arg(long)]
        workflow: String,

        #[arg(long)]
        order: u32,
    },
}

pub async fn cmd_step(args: StepArgs, ctx: &CliContext) -> Result<()> {
    let store = ctx.store();
    match args.action {
        StepCommand::Upsert {
            workflow,
            order,
            action,
            value,
            description,
            selector,
        } => {
            let mut request =
                RecordRequest::new(WorkflowId::from(workflow), order, StepAction::parse(&action));
            request.action_value = value;
            request.description = description;
            if let Some(css) = selector {
                request = request.with_target(RecordTarget::Selectors(SelectorSet::from_css(css)));
            }
            let step = StepRecorder::new(store)
                .record(request)
                .await
                .context("Failed to record step")?;
            println!("Recorded step {} ({}) as {}", step.order, step.action, step.id);
        }
        StepCommand::List {
            workflow,
            order,
            json,
        } => {
            let workflow_id = WorkflowId::from(workflow);
            let steps = store
                .list_steps(&workflow_id, order)
                .await
                .context("Failed to list steps")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&steps)?);
            } else if steps.is_empty() {
                println!("No steps found for workflow {}", workflow_id);
            } else {
                for step in &steps {
                    println!("{}", describe_step(step));
                }
            }
        }
        StepCommand::Delete { workflow, order } => {
            let workflow_id = WorkflowId::from(workflow);
            let removed = store
                .delete_step(&workflow_id, order)
                .await
                .context("Failed to delete step")?;
            if !removed {
                bail!("workflow {} has no step {}", workflow_id, order);
            }
            println!("Deleted step {} of workflow {}", order, workflow_id);
        }
    }
    Ok(())
}

fn describe_step(step: &WorkflowStep) -> String {
    let mut line = format!("{:>3}. {}", step.order, step.action);
    if let Some(value) = &step.action_value {
        line.push_str(&format!(" {:?}", value));
    }
    if let Some(selectors) = &step.selector_set {
        line.push_str(&format!(
            " @ {} (+{} fallbacks)",
            selectors.best_selector,
            selectors.strategies.len().saturating_sub(1)
        ));
    }
    if let Some(description) = &step.description {
        line.push_str(&format!("  # {}", description));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_core_types::{StepDraft, StepId};

    #[test]
    fn step_lines_show_value_and_selector() {
        let step = StepDraft::new(WorkflowId::from("wf"), 2, StepAction::Click)
            .with_selectors(SelectorSet::from_css("#go"))
            .with_description("press go")
            .into_step(StepId::new());
        assert_eq!(describe_step(&step), "  2. click @ #go (+0 fallbacks)  # press go");

        let typed = StepDraft::new(WorkflowId::from("wf"), 3, StepAction::Type)
            .with_value("{{email}}")
            .into_step(StepId::new());
        assert_eq!(describe_step(&typed), "  3. type \"{{email}}\"");
    }
}
