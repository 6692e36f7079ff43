//! Workflow replay and recording.
//!
//! [`DefaultWorkflowExecutor`] replays stored steps against a page with
//! human-plausible pacing, isolating failures per step. [`StepRecorder`]
//! captures selector sets for live elements and persists steps.

pub mod errors;
pub mod executor;
pub mod recorder;
pub mod types;
pub mod variables;

pub use errors::{FlowError, RecordError, StepError};
pub use executor::{DefaultWorkflowExecutor, WorkflowExecutor};
pub use recorder::{RecordRequest, RecordTarget, StepRecorder};
pub use types::*;
pub use variables::{Resolution, VariableResolver, DUMMY_VALUES};
