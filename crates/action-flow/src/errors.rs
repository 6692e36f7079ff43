//! Replay and recording error types

use action_locator::LocatorError;
use action_primitives::ActionError;
use retrace_workflow_store::StoreError;
use thiserror::Error;

/// Failure of a single step. Always recorded on the step, never fatal to the run.
#[derive(Debug, Error, Clone)]
pub enum StepError {
    /// Step is missing a value or selector set its action needs
    #[error("{0}")]
    Validation(String),

    /// No recorded strategy matched a live element
    #[error("{0}")]
    Resolution(#[from] LocatorError),

    /// A page primitive, download, or file operation failed
    #[error("{0}")]
    Action(#[from] ActionError),

    #[error("unknown action type: {0}")]
    UnknownAction(String),

    #[error("step timed out after {0} ms")]
    Timeout(u64),
}

impl StepError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StepError::Validation(msg.into())
    }
}

impl From<action_primitives::DriverError> for StepError {
    fn from(err: action_primitives::DriverError) -> Self {
        StepError::Action(ActionError::Driver(err))
    }
}

/// Errors that end a run before any step executes
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("failed to load workflow steps: {0}")]
    Storage(#[from] StoreError),
}

/// Errors raised while recording a step
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid step: {0}")]
    Validation(String),

    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("failed to capture selectors: {0}")]
    Locator(#[from] LocatorError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
