use clap::Subcommand;

use super::config::ConfigArgs;
use super::rehearse::RehearseArgs;
use super::step::StepArgs;
use super::timing::TimingArgs;
use super::vars::VarsArgs;
use super::workflow::WorkflowArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Create and list workflows
    Workflow(WorkflowArgs),

    /// Record, list and delete workflow steps
    Step(StepArgs),

    /// Preview `{{variable}}` substitution for a template
    Vars(VarsArgs),

    /// Sample the timing model and print delay statistics
    Timing(TimingArgs),

    /// Replay a workflow against a dry-run page
    Rehearse(RehearseArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}
