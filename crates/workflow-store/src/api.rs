use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use retrace_core_types::{StepDraft, Workflow, WorkflowId, WorkflowStep};
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, info};

use crate::errors::{StoreError, StoreErrorKind};
use crate::model::{CatalogFile, WorkflowCatalog};

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn create_workflow(
        &self,
        name: &str,
        description: Option<String>,
    ) -> StoreResult<Workflow>;
    async fn get_workflow(&self, id: &WorkflowId) -> StoreResult<Option<Workflow>>;
    async fn list_workflows(&self) -> StoreResult<Vec<Workflow>>;

    /// Steps of a workflow in ascending order, optionally only the one at
    /// `order`. An unknown workflow yields an empty list.
    async fn list_steps(
        &self,
        workflow_id: &WorkflowId,
        order: Option<u32>,
    ) -> StoreResult<Vec<WorkflowStep>>;

    /// Update the step at `(workflow_id, order)` or insert a new one.
    async fn upsert_step(&self, draft: StepDraft) -> StoreResult<WorkflowStep>;

    /// Returns whether a step was removed.
    async fn delete_step(&self, workflow_id: &WorkflowId, order: u32) -> StoreResult<bool>;
}

#[derive(Default)]
pub struct InMemoryWorkflowStore {
    catalog: RwLock<WorkflowCatalog>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn create_workflow(
        &self,
        name: &str,
        description: Option<String>,
    ) -> StoreResult<Workflow> {
        let workflow = Workflow::new(name, description);
        self.catalog.write().insert_workflow(workflow.clone());
        debug!(workflow_id = %workflow.id, name, "created workflow");
        Ok(workflow)
    }

    async fn get_workflow(&self, id: &WorkflowId) -> StoreResult<Option<Workflow>> {
        Ok(self.catalog.read().workflow(id).cloned())
    }

    async fn list_workflows(&self) -> StoreResult<Vec<Workflow>> {
        Ok(self.catalog.read().workflows())
    }

    async fn list_steps(
        &self,
        workflow_id: &WorkflowId,
        order: Option<u32>,
    ) -> StoreResult<Vec<WorkflowStep>> {
        Ok(self.catalog.read().steps(workflow_id, order))
    }

    async fn upsert_step(&self, draft: StepDraft) -> StoreResult<WorkflowStep> {
        self.catalog.write().upsert_step(draft)
    }

    async fn delete_step(&self, workflow_id: &WorkflowId, order: u32) -> StoreResult<bool> {
        Ok(self.catalog.write().delete_step(workflow_id, order))
    }
}

/// Keeps the whole catalog in one JSON document. Every mutation rewrites the
/// document through a temp file and rename; writers are serialized.
pub struct JsonFileWorkflowStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileWorkflowStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<WorkflowCatalog> {
        let path = self.path.clone();
        let file = task::spawn_blocking(move || read_catalog_file(&path))
            .await
            .map_err(|err| StoreErrorKind::Internal(err.to_string()))??;
        WorkflowCatalog::from_file(file)
    }

    async fn save(&self, catalog: &WorkflowCatalog) -> StoreResult<()> {
        let path = self.path.clone();
        let file = catalog.to_file();
        task::spawn_blocking(move || write_catalog_file(&path, &file))
            .await
            .map_err(|err| StoreErrorKind::Internal(err.to_string()))??;
        Ok(())
    }

    async fn mutate<T: Send>(
        &self,
        op: impl FnOnce(&mut WorkflowCatalog) -> StoreResult<T> + Send,
    ) -> StoreResult<T> {
        let _guard = self.write_lock.lock().await;
        let mut catalog = self.load().await?;
        let out = op(&mut catalog)?;
        self.save(&catalog).await?;
        Ok(out)
    }
}

fn read_catalog_file(path: &Path) -> StoreResult<CatalogFile> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CatalogFile::default())
        }
        Err(err) => return Err(err.into()),
    };
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(CatalogFile::default());
    }
    serde_json::from_slice(&raw)
        .map_err(|err| StoreErrorKind::Corrupt(format!("{}: {}", path.display(), err)).into())
}

fn write_catalog_file(path: &Path, file: &CatalogFile) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_vec_pretty(file)
        .map_err(|err| StoreErrorKind::Internal(err.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl WorkflowStore for JsonFileWorkflowStore {
    async fn create_workflow(
        &self,
        name: &str,
        description: Option<String>,
    ) -> StoreResult<Workflow> {
        let workflow = Workflow::new(name, description);
        let created = workflow.clone();
        self.mutate(move |catalog| {
            catalog.insert_workflow(workflow);
            Ok(())
        })
        .await?;
        info!(workflow_id = %created.id, path = %self.path.display(), "created workflow");
        Ok(created)
    }

    async fn get_workflow(&self, id: &WorkflowId) -> StoreResult<Option<Workflow>> {
        Ok(self.load().await?.workflow(id).cloned())
    }

    async fn list_workflows(&self) -> StoreResult<Vec<Workflow>> {
        Ok(self.load().await?.workflows())
    }

    async fn list_steps(
        &self,
        workflow_id: &WorkflowId,
        order: Option<u32>,
    ) -> StoreResult<Vec<WorkflowStep>> {
        Ok(self.load().await?.steps(workflow_id, order))
    }

    async fn upsert_step(&self, draft: StepDraft) -> StoreResult<WorkflowStep> {
        self.mutate(move |catalog| catalog.upsert_step(draft)).await
    }

    async fn delete_step(&self, workflow_id: &WorkflowId, order: u32) -> StoreResult<bool> {
        self.mutate(|catalog| Ok(catalog.delete_step(workflow_id, order)))
            .await
    }
}
