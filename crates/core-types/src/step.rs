//! Workflows and their recorded steps

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SelectorSet, StepId, WorkflowId};

/// Action tag carried by a recorded step.
///
/// Tags outside the known set are preserved as [`StepAction::Unknown`] so that
/// replay can report them per step instead of refusing to load the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepAction {
    Click,
    Type,
    Wait,
    Scroll,
    Nav,
    Hover,
    Extract,
    Screenshot,
    UploadImage,
    Unknown(String),
}

impl StepAction {
    pub const KNOWN: [StepAction; 9] = [
        StepAction::Click,
        StepAction::Type,
        StepAction::Wait,
        StepAction::Scroll,
        StepAction::Nav,
        StepAction::Hover,
        StepAction::Extract,
        StepAction::Screenshot,
        StepAction::UploadImage,
    ];

    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "click" => StepAction::Click,
            "type" => StepAction::Type,
            "wait" => StepAction::Wait,
            "scroll" => StepAction::Scroll,
            "nav" => StepAction::Nav,
            "hover" => StepAction::Hover,
            "extract" => StepAction::Extract,
            "screenshot" => StepAction::Screenshot,
            "upload_image" => StepAction::UploadImage,
            _ => StepAction::Unknown(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StepAction::Click => "click",
            StepAction::Type => "type",
            StepAction::Wait => "wait",
            StepAction::Scroll => "scroll",
            StepAction::Nav => "nav",
            StepAction::Hover => "hover",
            StepAction::Extract => "extract",
            StepAction::Screenshot => "screenshot",
            StepAction::UploadImage => "upload_image",
            StepAction::Unknown(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, StepAction::Unknown(_))
    }

    /// Actions that cannot run without a recorded element.
    pub fn requires_element(&self) -> bool {
        matches!(
            self,
            StepAction::Click | StepAction::Hover | StepAction::Extract | StepAction::UploadImage
        )
    }

    /// Actions that make use of a recorded element when one is present.
    pub fn accepts_element(&self) -> bool {
        self.requires_element() || matches!(self, StepAction::Type)
    }
}

impl From<String> for StepAction {
    fn from(value: String) -> Self {
        StepAction::parse(&value)
    }
}

impl From<StepAction> for String {
    fn from(value: StepAction) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow aggregate that owns an ordered list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: WorkflowId::new(),
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single recorded step. `order` is 1-based and unique within its workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: StepId,
    pub workflow_id: WorkflowId,
    pub order: u32,
    pub action: StepAction,
    #[serde(default)]
    pub action_value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub selector_set: Option<SelectorSet>,
}

/// Step content keyed by `(workflow_id, order)` for upserts.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDraft {
    pub workflow_id: WorkflowId,
    pub order: u32,
    pub action: StepAction,
    pub action_value: Option<String>,
    pub description: Option<String>,
    pub selector_set: Option<SelectorSet>,
}

impl StepDraft {
    pub fn new(workflow_id: WorkflowId, order: u32, action: StepAction) -> Self {
        Self {
            workflow_id,
            order,
            action,
            action_value: None,
            description: None,
            selector_set: None,
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

    pub fn with_selectors(mut self, selectors: SelectorSet) -> Self {
        self.selector_set = Some(selectors);
        self
    }

    /// Materialize the draft as a step with the given id.
    pub fn into_step(self, id: StepId) -> WorkflowStep {
        WorkflowStep {
            id,
            workflow_id: self.workflow_id,
            order: self.order,
            action: self.action,
            action_value: self.action_value,
            description: self.description,
            selector_set: self.selector_set,
        }
    }
}
