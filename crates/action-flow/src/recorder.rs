//! Recording steps: capture a live element's selectors and persist the step.

use std::sync::Arc;

use action_locator::SelectorStrategyGenerator;
use action_primitives::{ElementHandle, PageDriver};
use retrace_core_types::{SelectorSet, StepAction, StepDraft, WorkflowId, WorkflowStep};
use retrace_workflow_store::WorkflowStore;
use tracing::{debug, info};

use crate::errors::RecordError;

/// What a recorded step points at
#[derive(Debug, Clone)]
pub enum RecordTarget {
    /// A live element; selectors are captured through the page
    Element(ElementHandle),
    /// Selectors captured earlier
    Selectors(SelectorSet),
}

#[derive(Debug, Clone)]
pub struct RecordRequest {
    pub workflow_id: WorkflowId,
    pub order: u32,
    pub action: StepAction,
    pub action_value: Option<String>,
    pub description: Option<String>,
    pub target: Option<RecordTarget>,
}

impl RecordRequest {
    pub fn new(workflow_id: WorkflowId, order: u32, action: StepAction) -> Self {
        Self {
            workflow_id,
            order,
            action,
            action_value: None,
            description: None,
            target: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.action_value = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_target(mut self, target: RecordTarget) -> Self {
        self.target = Some(target);
        self
    }
}

pub struct StepRecorder {
    store: Arc<dyn WorkflowStore>,
    page: Option<Arc<dyn PageDriver>>,
    generator: SelectorStrategyGenerator,
}

impl StepRecorder {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self {
            store,
            page: None,
            generator: SelectorStrategyGenerator::new(),
        }
    }

    /// Page used to describe [`RecordTarget::Element`] targets
    pub fn with_page(mut self, page: Arc<dyn PageDriver>) -> Self {
        self.page = Some(page);
        self
    }

    /// Validate, capture selectors if needed, and upsert the step at
    /// `(workflow_id, order)`.
    pub async fn record(&self, request: RecordRequest) -> Result<WorkflowStep, RecordError> {
        if !request.action.is_known() {
            return Err(RecordError::Validation(format!(
                "unknown action type: {}",
                request.action
            )));
        }
        if request.order == 0 {
            return Err(RecordError::Validation(
                "step order must be 1 or greater".to_string(),
            ));
        }
        if request.action.requires_element() && request.target.is_none() {
            return Err(RecordError::Validation(format!(
                "{} requires a target element",
                request.action
            )));
        }

        if self.store.get_workflow(&request.workflow_id).await?.is_none() {
            return Err(RecordError::WorkflowNotFound(
                request.workflow_id.to_string(),
            ));
        }

        let selectors = match request.target {
            Some(target) if request.action.accepts_element() => {
                Some(self.selectors_for(target).await?)
            }
            Some(_) => {
                debug!(action = %request.action, "ignoring target for elementless action");
                None
            }
            None => None,
        };

        let mut draft = StepDraft::new(request.workflow_id, request.order, request.action);
        draft.action_value = request.action_value;
        draft.description = request.description;
        draft.selector_set = selectors;

        let step = self.store.upsert_step(draft).await?;
        info!(
            workflow_id = %step.workflow_id,
            order = step.order,
            action = %step.action,
            "recorded step"
        );
        Ok(step)
    }

    async fn selectors_for(&self, target: RecordTarget) -> Result<SelectorSet, RecordError> {
        match target {
            RecordTarget::Selectors(set) => Ok(set),
            RecordTarget::Element(element) => {
                let page = self.page.as_ref().ok_or_else(|| {
                    RecordError::Validation(
                        "a page is required to capture element selectors".to_string(),
                    )
                })?;
                Ok(self.generator.capture(page.as_ref(), &element).await?)
            }
        }
    }
}
