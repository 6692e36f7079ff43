//! Workflow catalog shared by every store implementation.

use std::collections::BTreeMap;

use chrono::Utc;
use retrace_core_types::{StepDraft, StepId, Workflow, WorkflowId, WorkflowStep};
use serde::{Deserialize, Serialize};

use crate::errors::{StoreError, StoreErrorKind};

/// Workflows and their steps keyed by `(workflow, order)`.
#[derive(Clone, Debug, Default)]
pub struct WorkflowCatalog {
    workflows: BTreeMap<WorkflowId, Workflow>,
    steps: BTreeMap<WorkflowId, BTreeMap<u32, WorkflowStep>>,
}

/// On-disk layout of a catalog.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub workflows: Vec<Workflow>,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowCatalog {
    pub fn insert_workflow(&mut self, workflow: Workflow) {
        self.workflows.insert(workflow.id.clone(), workflow);
    }

    pub fn workflow(&self, id: &WorkflowId) -> Option<&Workflow> {
        self.workflows.get(id)
    }

    /// Workflows, most recently updated first.
    pub fn workflows(&self) -> Vec<Workflow> {
        let mut list: Vec<Workflow> = self.workflows.values().cloned().collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }

    pub fn steps(&self, workflow_id: &WorkflowId, order: Option<u32>) -> Vec<WorkflowStep> {
        let Some(steps) = self.steps.get(workflow_id) else {
            return Vec::new();
        };
        match order {
            Some(order) => steps.get(&order).cloned().into_iter().collect(),
            None => steps.values().cloned().collect(),
        }
    }

    /// Update the step at `(workflow, order)` in place, or insert it with a
    /// fresh id.
    pub fn upsert_step(&mut self, draft: StepDraft) -> Result<WorkflowStep, StoreError> {
        if draft.order == 0 {
            return Err(StoreErrorKind::InvalidOrder.into());
        }
        let workflow = self
            .workflows
            .get_mut(&draft.workflow_id)
            .ok_or_else(|| StoreErrorKind::WorkflowNotFound(draft.workflow_id.to_string()))?;
        workflow.updated_at = Utc::now();

        let steps = self.steps.entry(draft.workflow_id.clone()).or_default();
        let id = steps
            .get(&draft.order)
            .map(|existing| existing.id.clone())
            .unwrap_or_else(StepId::new);
        let step = draft.into_step(id);
        steps.insert(step.order, step.clone());
        Ok(step)
    }

    pub fn delete_step(&mut self, workflow_id: &WorkflowId, order: u32) -> bool {
        let removed = self
            .steps
            .get_mut(workflow_id)
            .and_then(|steps| steps.remove(&order))
            .is_some();
        if removed {
            if let Some(workflow) = self.workflows.get_mut(workflow_id) {
                workflow.updated_at = Utc::now();
            }
        }
        removed
    }

    pub fn to_file(&self) -> CatalogFile {
        CatalogFile {
            workflows: self.workflows.values().cloned().collect(),
            steps: self
                .steps
                .values()
                .flat_map(|steps| steps.values().cloned())
                .collect(),
        }
    }

    /// Rebuild from disk. Steps whose workflow is missing or whose order
    /// repeats are rejected as corruption.
    pub fn from_file(file: CatalogFile) -> Result<Self, StoreError> {
        let mut catalog = WorkflowCatalog::default();
        for workflow in file.workflows {
            catalog.insert_workflow(workflow);
        }
        for step in file.steps {
            if !catalog.workflows.contains_key(&step.workflow_id) {
                return Err(StoreErrorKind::Corrupt(format!(
                    "step {} references unknown workflow {}",
                    step.id, step.workflow_id
                ))
                .into());
            }
            let steps = catalog.steps.entry(step.workflow_id.clone()).or_default();
            if steps.contains_key(&step.order) {
                return Err(StoreErrorKind::Corrupt(format!(
                    "workflow {} has two steps at order {}",
                    step.workflow_id, step.order
                ))
                .into());
            }
            steps.insert(step.order, step);
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_core_types::StepAction;

    #[test]
    fn file_round_trip_keeps_step_ids() {
        let mut catalog = WorkflowCatalog::default();
        let workflow = Workflow::new("login", None);
        let id = workflow.id.clone();
        catalog.insert_workflow(workflow);
        let step = catalog
            .upsert_step(StepDraft::new(id.clone(), 1, StepAction::Click))
            .unwrap();

        let restored = WorkflowCatalog::from_file(catalog.to_file()).unwrap();
        assert_eq!(restored.steps(&id, None), vec![step]);
    }

    #[test]
    fn orphan_steps_are_corrupt() {
        let file = CatalogFile {
            workflows: Vec::new(),
            steps: vec![StepDraft::new("ghost".into(), 1, StepAction::Wait)
                .into_step(StepId::new())],
        };
        let err = WorkflowCatalog::from_file(file).unwrap_err();
        assert!(matches!(err.kind(), StoreErrorKind::Corrupt(_)));
    }
}
