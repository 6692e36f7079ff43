//! Persistence for recorded workflows and their steps.

pub mod api;
pub mod errors;
pub mod model;

pub use api::{InMemoryWorkflowStore, JsonFileWorkflowStore, StoreResult, WorkflowStore};
pub use errors::{StoreError, StoreErrorKind};
pub use model::{CatalogFile, WorkflowCatalog};
