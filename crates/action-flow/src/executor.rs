//! Workflow executor implementation

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use action_locator::{DefaultElementResolver, ElementResolver, ResolutionResult};
use action_primitives::{
    ActionError, ActionKind, FileStore, ImageFetcher, PageDriver, ScrollBehavior,
};
use async_trait::async_trait;
use chrono::Utc;
use retrace_core_types::{ExecutionResult, RunSummary, SelectorSet, WorkflowStep};
use retrace_workflow_store::WorkflowStore;
use stealth::TimingModel;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::errors::{FlowError, StepError};
use crate::types::*;
use crate::variables::VariableResolver;

/// Workflow executor trait
#[async_trait]
pub trait WorkflowExecutor: Send + Sync {
    /// Replay a workflow's steps in order. Step failures are recorded on the
    /// report; only a storage failure aborts the call.
    async fn run(&self, request: RunRequest) -> Result<RunReport, FlowError>;
}

/// What a successful step reports
#[derive(Debug, Default)]
struct StepOutcome {
    detail: String,
    note: Option<String>,
}

impl StepOutcome {
    fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            note: None,
        }
    }

    fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Default workflow executor implementation
pub struct DefaultWorkflowExecutor {
    store: Arc<dyn WorkflowStore>,
    page: Arc<dyn PageDriver>,
    resolver: Arc<dyn ElementResolver>,
    files: Arc<dyn FileStore>,
    fetcher: Arc<dyn ImageFetcher>,
    timing: Arc<TimingModel>,
    variables: VariableResolver,
    options: ExecutorOptions,
}

impl DefaultWorkflowExecutor {
    /// Create an executor resolving elements against `page`
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        page: Arc<dyn PageDriver>,
        files: Arc<dyn FileStore>,
        fetcher: Arc<dyn ImageFetcher>,
        timing: Arc<TimingModel>,
    ) -> Self {
        Self {
            store,
            resolver: Arc::new(DefaultElementResolver::new(page.clone())),
            page,
            files,
            fetcher,
            timing,
            variables: VariableResolver::new(),
            options: ExecutorOptions::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ElementResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Pace, substitute, validate and dispatch one step
    async fn execute_step(
        &self,
        step: &WorkflowStep,
        variables: &HashMap<String, String>,
        dummies: &mut Vec<String>,
        transcript: &mut Vec<String>,
    ) -> Result<StepOutcome, StepError> {
        self.timing.think().await;

        let value = match step.action_value.as_deref() {
            Some(raw) if VariableResolver::has_placeholders(raw) => {
                let resolution = self.variables.resolve(raw, variables);
                for name in resolution.dummies {
                    if !dummies.contains(&name) {
                        transcript.push(format!("Using dummy value for {{{{{}}}}}", name));
                        dummies.push(name);
                    }
                }
                Some(resolution.value)
            }
            other => other.map(str::to_string),
        };

        let plan = StepPlan::from_step(step, value.as_deref())?;
        debug!(order = step.order, plan = ?plan, "dispatching step");

        match self.options.step_timeout {
            Some(limit) => timeout(limit, self.dispatch(step, plan))
                .await
                .map_err(|_| StepError::Timeout(limit.as_millis() as u64))?,
            None => self.dispatch(step, plan).await,
        }
    }

    async fn dispatch(&self, step: &WorkflowStep, plan: StepPlan) -> Result<StepOutcome, StepError> {
        match plan {
            StepPlan::Click { selectors } => {
                let target = self.resolve(&selectors).await?;
                self.page.hover(&target.element).await?;
                self.timing
                    .sleep(self.timing.hover_settle_delay())
                    .await;
                self.page.click(&target.element).await?;
                self.page.wait_for_action_events(ActionKind::Click).await?;
                Ok(StepOutcome::new(format!(
                    "clicked {}",
                    target.strategy.value
                )))
            }

            StepPlan::Type { text, selectors } => {
                if let Some(selectors) = selectors {
                    self.focus(&selectors).await;
                }
                let mut typed = 0usize;
                for ch in text.chars() {
                    self.timing.between_keys().await;
                    self.page.press_character(ch).await?;
                    typed += 1;
                    self.timing.hesitate().await;
                }
                Ok(StepOutcome::new(format!("typed {} characters", typed)))
            }

            StepPlan::Wait { ms } => {
                let delay = self.timing.wait_delay(ms);
                self.timing.sleep(delay).await;
                Ok(StepOutcome::new(format!("waited {} ms", delay.max(0))))
            }

            StepPlan::Scroll { delta } => {
                let increment = i64::from(self.timing.plan().scroll_step_px.max(1));
                // i64 so that i32::MIN can be negated
                let mut remaining = i64::from(delta);
                let mut increments = 0u32;
                while remaining != 0 {
                    let stride = remaining.signum() * remaining.abs().min(increment);
                    // |stride| <= |delta|, so it fits back into i32
                    self.page
                        .scroll_by(0, stride as i32, ScrollBehavior::Smooth)
                        .await?;
                    remaining -= stride;
                    increments += 1;
                    if remaining != 0 {
                        self.timing
                            .sleep(self.timing.scroll_pause_delay())
                            .await;
                    }
                }
                Ok(StepOutcome::new(format!(
                    "scrolled {}px in {} increments",
                    delta, increments
                )))
            }

            StepPlan::Nav { url } => {
                self.page.navigate(&url).await?;
                self.page
                    .wait_for_action_events(ActionKind::Navigate)
                    .await?;
                self.timing.sleep(self.timing.nav_settle_delay()).await;
                Ok(StepOutcome::new(format!("navigated to {}", url)))
            }

            StepPlan::Hover { selectors } => {
                let target = self.resolve(&selectors).await?;
                self.page.hover(&target.element).await?;
                self.page.wait_for_action_events(ActionKind::Hover).await?;
                self.timing.sleep(self.timing.hover_hold_delay()).await;
                Ok(StepOutcome::new(format!(
                    "hovered {}",
                    target.strategy.value
                )))
            }

            StepPlan::Extract { selectors } => {
                let target = self.resolve(&selectors).await?;
                let text = self
                    .page
                    .text_content(&target.element)
                    .await?
                    .unwrap_or_default();
                let shown = truncate_chars(&text, EXTRACT_TRANSCRIPT_CHARS);
                Ok(
                    StepOutcome::new(format!(
                        "extracted: {}",
                        truncate_chars(&text, EXTRACT_DETAIL_CHARS)
                    ))
                    .with_note(format!("Extracted text: {}", shown)),
                )
            }

            StepPlan::Screenshot { filename } => {
                let bytes = self.page.screenshot(true).await?;
                let path = self.files.save_file(&bytes, &filename).await?;
                Ok(StepOutcome::new(format!(
                    "saved screenshot to {}",
                    path.display()
                )))
            }

            StepPlan::UploadImage {
                selectors,
                image_url,
            } => {
                let target = self.resolve(&selectors).await?;
                let image = self.fetcher.fetch(&image_url).await?;
                let path = self
                    .files
                    .save_temporary_file(&image.bytes, &image.mime)
                    .await?;
                let method = self.upload(step, &target, path.clone()).await?;
                Ok(StepOutcome::new(format!(
                    "uploaded {} via {}",
                    path.display(),
                    method
                )))
            }
        }
    }

    async fn resolve(&self, selectors: &SelectorSet) -> Result<ResolutionResult, StepError> {
        Ok(self.resolver.resolve_set(selectors).await?)
    }

    /// Best-effort focus before typing
    async fn focus(&self, selectors: &SelectorSet) {
        match self.resolver.resolve_set(selectors).await {
            Ok(target) => {
                if let Err(err) = self.page.click(&target.element).await {
                    debug!(error = %err, "focus click failed, typing anyway");
                }
            }
            Err(err) => debug!(error = %err, "focus target not found, typing anyway"),
        }
    }

    /// Direct file assignment, falling back to the file chooser
    async fn upload(
        &self,
        step: &WorkflowStep,
        target: &ResolutionResult,
        path: PathBuf,
    ) -> Result<&'static str, ActionError> {
        let files = [path];
        let direct = match self.page.set_input_files(&target.element, &files).await {
            Ok(()) => return Ok("file input"),
            Err(err) => err,
        };
        debug!(
            order = step.order,
            error = %direct,
            "direct file assignment failed, trying file chooser"
        );
        match self
            .page
            .upload_via_file_chooser(&target.element, &files, self.options.file_chooser_timeout)
            .await
        {
            Ok(()) => Ok("file chooser"),
            Err(chooser) => Err(ActionError::UploadFailed {
                direct: direct.to_string(),
                chooser: chooser.to_string(),
            }),
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[async_trait]
impl WorkflowExecutor for DefaultWorkflowExecutor {
    async fn run(&self, request: RunRequest) -> Result<RunReport, FlowError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let workflow_id = request.workflow_id.clone();
        info!(workflow_id = %workflow_id, order = ?request.order, "starting workflow run");

        let steps = self.store.list_steps(&workflow_id, request.order).await?;

        let mut results: Vec<ExecutionResult> = Vec::with_capacity(steps.len());
        let mut transcript: Vec<String> = Vec::new();
        let mut dummies: Vec<String> = Vec::new();
        let mut aborted = None;

        if steps.is_empty() {
            transcript.push(match request.order {
                Some(order) => format!("No step {} found in workflow {}", order, workflow_id),
                None => format!("No steps found for workflow {}", workflow_id),
            });
        } else {
            transcript.push(format!(
                "Running {} step(s) of workflow {}",
                steps.len(),
                workflow_id
            ));
        }

        for step in &steps {
            if request.cancel.is_cancelled() {
                aborted = Some("run cancelled".to_string());
                break;
            }
            if let Some(limit) = self.options.run_timeout {
                if clock.elapsed() >= limit {
                    aborted = Some(format!("run timed out after {} ms", limit.as_millis()));
                    break;
                }
            }

            let action = step.action.as_str();
            info!(workflow_id = %workflow_id, order = step.order, action, "executing step");

            match self
                .execute_step(step, &request.variables, &mut dummies, &mut transcript)
                .await
            {
                Ok(outcome) => {
                    transcript.push(format!(
                        "Step {} ({}): {}",
                        step.order, action, outcome.detail
                    ));
                    if let Some(note) = outcome.note {
                        transcript.push(note);
                    }
                    results.push(ExecutionResult::success(step.order, action, outcome.detail));
                    self.timing.after_action().await;
                }
                Err(err) => {
                    warn!(
                        workflow_id = %workflow_id,
                        order = step.order,
                        action,
                        error = %err,
                        "step failed"
                    );
                    transcript.push(format!("Step {} ({}) failed: {}", step.order, action, err));
                    results.push(ExecutionResult::failure(step.order, action, err.to_string()));
                }
            }
        }

        if let Some(reason) = &aborted {
            warn!(workflow_id = %workflow_id, reason = %reason, "run stopped early");
            transcript.push(format!("Run stopped: {}", reason));
        }

        let summary = RunSummary::from_results(&results);
        info!(
            workflow_id = %workflow_id,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "workflow run finished"
        );

        Ok(RunReport {
            workflow_id,
            results,
            summary,
            dummy_variables: dummies,
            transcript,
            aborted,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
