//! Core types for workflow replay

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use retrace_core_types::{
    ExecutionResult, RunSummary, SelectorSet, StepAction, WorkflowId, WorkflowStep,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::errors::StepError;

/// Wait used when a wait step carries no usable duration
pub const DEFAULT_WAIT_MS: u64 = 1000;

/// Scroll distance used when a scroll step carries no usable delta
pub const DEFAULT_SCROLL_PX: i32 = 300;

/// Extracted text shown in the transcript, in characters
pub const EXTRACT_TRANSCRIPT_CHARS: usize = 100;

/// Extracted text kept on the step result, in characters
pub const EXTRACT_DETAIL_CHARS: usize = 50;

/// A validated step: each variant carries exactly what its action needs.
#[derive(Debug, Clone, PartialEq)]
pub enum StepPlan {
    Click {
        selectors: SelectorSet,
    },
    Type {
        text: String,
        selectors: Option<SelectorSet>,
    },
    Wait {
        ms: u64,
    },
    Scroll {
        delta: i32,
    },
    Nav {
        url: String,
    },
    Hover {
        selectors: SelectorSet,
    },
    Extract {
        selectors: SelectorSet,
    },
    Screenshot {
        filename: String,
    },
    UploadImage {
        selectors: SelectorSet,
        image_url: String,
    },
}

impl StepPlan {
    /// Validate `step` against its action, using `value` as the (already
    /// substituted) action value.
    pub fn from_step(step: &WorkflowStep, value: Option<&str>) -> Result<Self, StepError> {
        // typed text is taken verbatim; every other value treats blank as absent
        let text = value.filter(|v| !v.is_empty());
        let value = value.filter(|v| !v.trim().is_empty());
        let selectors = step.selector_set.as_ref().filter(|s| !s.is_empty()).cloned();
        let action = &step.action;

        let required_selectors = || {
            selectors
                .clone()
                .ok_or_else(|| StepError::validation(format!("{} requires a selector set", action)))
        };
        let required_value = |what: &str| {
            value
                .map(|v| v.trim().to_string())
                .ok_or_else(|| StepError::validation(format!("{} requires {}", action, what)))
        };

        match action {
            StepAction::Click => Ok(StepPlan::Click {
                selectors: required_selectors()?,
            }),
            StepAction::Type => Ok(StepPlan::Type {
                text: text.map(str::to_string).ok_or_else(|| {
                    StepError::validation(format!("{} requires a non-empty value", action))
                })?,
                selectors: selectors.clone(),
            }),
            StepAction::Wait => Ok(StepPlan::Wait {
                ms: value
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_WAIT_MS),
            }),
            StepAction::Scroll => Ok(StepPlan::Scroll {
                delta: value
                    .and_then(|v| v.trim().parse::<i32>().ok())
                    .unwrap_or(DEFAULT_SCROLL_PX),
            }),
            StepAction::Nav => Ok(StepPlan::Nav {
                url: required_value("a URL")?,
            }),
            StepAction::Hover => Ok(StepPlan::Hover {
                selectors: required_selectors()?,
            }),
            StepAction::Extract => Ok(StepPlan::Extract {
                selectors: required_selectors()?,
            }),
            StepAction::Screenshot => Ok(StepPlan::Screenshot {
                filename: value.map(|v| v.trim().to_string()).unwrap_or_else(|| {
                    format!("workflow_{}_step_{}.png", step.workflow_id, step.order)
                }),
            }),
            StepAction::UploadImage => Ok(StepPlan::UploadImage {
                selectors: required_selectors()?,
                image_url: required_value("an image URL")?,
            }),
            StepAction::Unknown(tag) => Err(StepError::UnknownAction(tag.clone())),
        }
    }
}

/// Replay limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorOptions {
    /// Limit on each step's dispatch, excluding its thinking delay
    pub step_timeout: Option<Duration>,
    /// No step starts once the run has been going this long
    pub run_timeout: Option<Duration>,
    /// How long the page may take to open a file chooser
    pub file_chooser_timeout: Duration,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            step_timeout: None,
            run_timeout: None,
            file_chooser_timeout: Duration::from_secs(5),
        }
    }
}

/// One run invocation
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub workflow_id: WorkflowId,
    /// Run only the step at this order
    pub order: Option<u32>,
    pub variables: HashMap<String, String>,
    pub cancel: CancellationToken,
}

impl RunRequest {
    pub fn new(workflow_id: WorkflowId) -> Self {
        Self {
            workflow_id,
            order: None,
            variables: HashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Outcome of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub workflow_id: WorkflowId,
    pub results: Vec<ExecutionResult>,
    pub summary: RunSummary,
    /// Variables that fell back to dummy values
    pub dummy_variables: Vec<String>,
    pub transcript: Vec<String>,
    /// Why the run stopped early, when it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.summary.failed == 0
    }

    /// Transcript followed by the summary line
    pub fn render(&self) -> String {
        let mut out = self.transcript.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!(
            "Summary: {} total, {} succeeded, {} failed",
            self.summary.total, self.summary.succeeded, self.summary.failed
        ));
        if let Some(reason) = &self.aborted {
            out.push_str(&format!(" (aborted: {})", reason));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_core_types::{StepDraft, StepId};

    fn step(action: StepAction) -> StepDraft {
        StepDraft::new("wf-1".into(), 3, action)
    }

    fn plan(draft: StepDraft) -> Result<StepPlan, StepError> {
        let value = draft.action_value.clone();
        let step = draft.into_step(StepId::new());
        StepPlan::from_step(&step, value.as_deref())
    }

    #[test]
    fn element_actions_need_selectors() {
        for action in [
            StepAction::Click,
            StepAction::Hover,
            StepAction::Extract,
        ] {
            let err = plan(step(action.clone())).unwrap_err();
            assert_eq!(err.to_string(), format!("{} requires a selector set", action));
        }
        let empty = step(StepAction::Click).with_selectors(SelectorSet::default());
        assert!(plan(empty).is_err());
        let ok = step(StepAction::Click).with_selectors(SelectorSet::from_css("#a"));
        assert!(matches!(plan(ok), Ok(StepPlan::Click { .. })));
    }

    #[test]
    fn wait_and_scroll_defaults() {
        assert_eq!(plan(step(StepAction::Wait)).unwrap(), StepPlan::Wait { ms: 1000 });
        assert_eq!(
            plan(step(StepAction::Wait).with_value("soon")).unwrap(),
            StepPlan::Wait { ms: 1000 }
        );
        assert_eq!(
            plan(step(StepAction::Wait).with_value(" 250 ")).unwrap(),
            StepPlan::Wait { ms: 250 }
        );
        assert_eq!(
            plan(step(StepAction::Scroll)).unwrap(),
            StepPlan::Scroll { delta: 300 }
        );
        assert_eq!(
            plan(step(StepAction::Scroll).with_value("-450")).unwrap(),
            StepPlan::Scroll { delta: -450 }
        );
    }

    #[test]
    fn value_requirements() {
        assert!(plan(step(StepAction::Type).with_value("")).is_err());
        assert_eq!(
            plan(step(StepAction::Type).with_value("   ")).unwrap(),
            StepPlan::Type {
                text: "   ".into(),
                selectors: None,
            }
        );
        assert!(plan(step(StepAction::Nav)).is_err());
        let upload = step(StepAction::UploadImage).with_selectors(SelectorSet::from_css("#f"));
        assert_eq!(
            plan(upload).unwrap_err().to_string(),
            "upload_image requires an image URL"
        );
        // scroll needs neither an element nor a selector set
        assert_eq!(
            plan(step(StepAction::Scroll).with_value("100")).unwrap(),
            StepPlan::Scroll { delta: 100 }
        );
    }

    #[test]
    fn screenshot_filename() {
        assert_eq!(
            plan(step(StepAction::Screenshot)).unwrap(),
            StepPlan::Screenshot {
                filename: "workflow_wf-1_step_3.png".into()
            }
        );
        assert_eq!(
            plan(step(StepAction::Screenshot).with_value("home.png")).unwrap(),
            StepPlan::Screenshot {
                filename: "home.png".into()
            }
        );
    }

    #[test]
    fn unknown_action() {
        let err = plan(step(StepAction::Unknown("drag".into()))).unwrap_err();
        assert_eq!(err.to_string(), "unknown action type: drag");
    }
}
