//! Page driver contract consumed by the replay engine

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ActionKind, ElementHandle, ElementSnapshot, ScrollBehavior};

/// High-level error categories surfaced by a page driver.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DriverErrorKind {
    #[error("navigation failed")]
    Navigation,
    #[error("navigation timed out")]
    NavTimeout,
    #[error("driver i/o failure")]
    Io,
    #[error("invalid selector")]
    InvalidSelector,
    #[error("element detached")]
    Detached,
    #[error("file chooser did not open")]
    FileChooserTimeout,
    #[error("operation not supported")]
    Unsupported,
    #[error("internal error")]
    Internal,
}

/// Enriched driver failure passed back to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub hint: Option<String>,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for DriverError {}

impl DriverError {
    pub fn new(kind: DriverErrorKind) -> Self {
        Self { kind, hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Browser page primitives. Implementations own the browser connection; the
/// engine only sequences these calls.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// First element matching a CSS selector
    async fn query_selector(&self, css: &str) -> Result<Option<ElementHandle>, DriverError>;

    /// First element matching an XPath expression
    async fn query_xpath(&self, xpath: &str) -> Result<Option<ElementHandle>, DriverError>;

    async fn hover(&self, element: &ElementHandle) -> Result<(), DriverError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    /// Type one character into the focused element
    async fn press_character(&self, ch: char) -> Result<(), DriverError>;

    async fn text_content(&self, element: &ElementHandle) -> Result<Option<String>, DriverError>;

    /// Tag, attributes, ancestry and accessibility data of a live element
    async fn describe_element(&self, element: &ElementHandle)
        -> Result<ElementSnapshot, DriverError>;

    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    async fn scroll_by(&self, dx: i32, dy: i32, behavior: ScrollBehavior)
        -> Result<(), DriverError>;

    /// PNG bytes of the viewport, or of the whole page when `full_page`
    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, DriverError>;

    /// Assign files directly to a file input
    async fn set_input_files(
        &self,
        element: &ElementHandle,
        files: &[PathBuf],
    ) -> Result<(), DriverError>;

    /// Click `trigger`, wait up to `timeout` for a file chooser and accept `files`
    async fn upload_via_file_chooser(
        &self,
        trigger: &ElementHandle,
        files: &[PathBuf],
        timeout: Duration,
    ) -> Result<(), DriverError>;

    /// Let the side effects of the last primitive settle
    async fn wait_for_action_events(&self, kind: ActionKind) -> Result<(), DriverError>;
}
