use serde::{Deserialize, Serialize};

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub step_order: u32,
    pub action: String,
    pub success: bool,
    pub detail: String,
}

impl ExecutionResult {
    pub fn success(step_order: u32, action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            step_order,
            action: action.into(),
            success: true,
            detail: detail.into(),
        }
    }

    pub fn failure(step_order: u32, action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            step_order,
            action: action.into(),
            success: false,
            detail: detail.into(),
        }
    }
}

/// Aggregate counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_results(results: &[ExecutionResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}
