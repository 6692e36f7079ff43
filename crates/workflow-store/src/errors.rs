use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum StoreErrorKind {
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),
    #[error("step order must be 1 or greater")]
    InvalidOrder,
    #[error("storage i/o failed: {0}")]
    Io(String),
    #[error("stored catalog is corrupt: {0}")]
    Corrupt(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Error)]
#[error(transparent)]
pub struct StoreError(pub StoreErrorKind);

impl StoreError {
    pub fn new(kind: StoreErrorKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &StoreErrorKind {
        &self.0
    }
}

impl From<StoreErrorKind> for StoreError {
    fn from(kind: StoreErrorKind) -> Self {
        StoreError(kind)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError(StoreErrorKind::Io(err.to_string()))
    }
}
