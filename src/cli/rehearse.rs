use std::sync::Arc;
use std::time::Duration;

use action_flow::{DefaultWorkflowExecutor, RunReport, RunRequest, WorkflowExecutor};
use action_primitives::{HttpImageFetcher, LocalFileStore, ScriptedPage};
use anyhow::{bail, ensure, Context, Result};
use clap::Args;
use retrace_core_types::WorkflowId;
use stealth::{TempoPlan, TimingModel};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::context::CliContext;
use super::vars::{collect_vars, parse_var};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Args, Clone, Debug)]
pub struct RehearseArgs {
    #[arg(long)]
    pub workflow: String,

    /// Replay only the step at this order
    #[arg(long)]
    pub order: Option<u32>,

    /// Variable binding as name=value (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Pacing multiplier; 0 skips every pause
    #[arg(long)]
    pub speed: Option<f64>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub json: bool,
}

/// Tempo plan with command-line overrides applied on top of the configured one
pub fn rehearsal_plan(base: &TempoPlan, speed: Option<f64>, seed: Option<u64>) -> Result<TempoPlan> {
    let mut plan = base.clone();
    if let Some(speed) = speed {
        plan.speed = speed;
    }
    if seed.is_some() {
        plan.seed = seed;
    }
    plan.validate().context("Invalid pacing options")?;
    Ok(plan)
}

pub async fn cmd_rehearse(args: RehearseArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let store = ctx.store();
    let workflow_id = WorkflowId::from(args.workflow);

    ensure!(
        store.get_workflow(&workflow_id).await?.is_some(),
        "workflow {} not found",
        workflow_id
    );

    let plan = rehearsal_plan(&config.tempo, args.speed, args.seed)?;
    let executor = DefaultWorkflowExecutor::new(
        store,
        Arc::new(ScriptedPage::dry_run()),
        Arc::new(LocalFileStore::new(config.output.dir.clone())),
        Arc::new(HttpImageFetcher::new(FETCH_TIMEOUT).context("Failed to build HTTP client")?),
        Arc::new(TimingModel::new(plan)),
    )
    .with_options(config.replay.executor_options());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current step");
            on_interrupt.cancel();
        }
    });

    let mut request = RunRequest::new(workflow_id.clone())
        .with_variables(collect_vars(args.vars))
        .with_cancellation(cancel);
    request.order = args.order;

    info!(workflow_id = %workflow_id, "rehearsing workflow against dry-run page");
    let report = executor
        .run(request)
        .await
        .context("Rehearsal could not start")?;

    print_report(&report, args.json)?;
    if !report.is_success() {
        bail!(
            "rehearsal finished with {} failed step(s){}",
            report.summary.failed,
            report
                .aborted
                .as_deref()
                .map(|reason| format!(", {}", reason))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report.render());
        if !report.dummy_variables.is_empty() {
            println!("Dummy values used for: {}", report.dummy_variables.join(", "));
        }
    }
    Ok(())
}
